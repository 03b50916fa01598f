//! UI state machine: display mode plus the open tooltip, driven by a pure reducer.

use crate::types::{Record, Selection, ViewMode};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InteractionState {
    pub mode: ViewMode,
    pub selection: Option<Selection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ToggleMode,
    SelectPoint {
        index: usize,
        record: Record,
        screen_x: f64,
        screen_y: f64,
    },
    ClearSelection,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reduce(&self, event: Event) -> Self {
        reduce(self, event)
    }
}

pub fn reduce(state: &InteractionState, event: Event) -> InteractionState {
    match event {
        // Switching modes always closes the tooltip
        Event::ToggleMode => InteractionState {
            mode: state.mode.toggled(),
            selection: None,
        },
        Event::SelectPoint {
            index,
            record,
            screen_x,
            screen_y,
        } => match state.mode {
            // Heatmap has no clickable targets
            ViewMode::Heatmap => state.clone(),
            ViewMode::Points => InteractionState {
                mode: state.mode,
                selection: Some(Selection {
                    index,
                    record,
                    screen_x,
                    screen_y,
                }),
            },
        },
        Event::ClearSelection => InteractionState {
            mode: state.mode,
            selection: None,
        },
    }
}
