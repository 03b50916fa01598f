//! Frame composition: turns `(mode, records, selection)` into the layer and
//! tooltip descriptions the map rendering engine consumes.
//!
//! Frames are rebuilt from scratch on every render and carry nothing but what
//! the inputs determine, so two compositions of the same inputs compare equal.

use crate::classify::{classify, weight, Rgba};
use crate::config::{AccessToken, AppConfig};
use crate::interaction::InteractionState;
use crate::types::{Record, ViewMode};
use crate::viewport::ViewState;
use rayon::prelude::*;
use serde::Serialize;

pub const HEATMAP_LAYER_ID: &str = "heatmap-layer";
pub const POINTS_LAYER_ID: &str = "points-layer";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub view_state: ViewState,
    pub controller: bool,
    pub base_map: BaseMap,
    pub layers: Vec<LayerDescriptor>,
    pub toggle: ToggleControl,
    pub tooltip: Option<Tooltip>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseMap {
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<AccessToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerDescriptor {
    Heatmap(HeatmapLayer),
    Scatter(ScatterLayer),
}

impl LayerDescriptor {
    #[cfg(test)]
    pub fn id(&self) -> &str {
        match self {
            LayerDescriptor::Heatmap(layer) => &layer.id,
            LayerDescriptor::Scatter(layer) => &layer.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapLayer {
    pub id: String,
    pub radius_pixels: f64,
    pub intensity: f64,
    pub threshold: f64,
    pub data: Vec<WeightedPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedPoint {
    pub position: [f64; 2],
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterLayer {
    pub id: String,
    pub pickable: bool,
    pub radius_units: RadiusUnits,
    pub on_click: ClickAction,
    pub data: Vec<StyledPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RadiusUnits {
    Pixels,
}

/// What a click on a scatter point feeds back into the interaction controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAction {
    SelectPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StyledPoint {
    pub index: usize,
    pub position: [f64; 2],
    pub fill_color: Rgba,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleControl {
    pub label: String,
}

/// Tooltip for the selected record, pinned where the click happened.
///
/// The screen position is not re-projected when the camera moves; `anchor` carries the
/// record's coordinate for engines that want to follow it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub pagos: u64,
    pub evasiones: u64,
    pub payment_percent: String,
    pub screen_x: f64,
    pub screen_y: f64,
    pub anchor: [f64; 2],
}

pub fn toggle_label(mode: ViewMode) -> &'static str {
    match mode.toggled() {
        ViewMode::Heatmap => "Show heatmap",
        ViewMode::Points => "Show points",
    }
}

pub fn heatmap_layer(records: &[Record], config: &AppConfig) -> HeatmapLayer {
    let source = config.heatmap.weight;
    let data = records
        .par_iter()
        .map(|record| WeightedPoint {
            position: record.position(),
            weight: weight(record, source),
        })
        .collect();

    HeatmapLayer {
        id: HEATMAP_LAYER_ID.to_string(),
        radius_pixels: config.heatmap.radius_pixels,
        intensity: config.heatmap.intensity,
        threshold: config.heatmap.threshold,
        data,
    }
}

pub fn scatter_layer(records: &[Record], config: &AppConfig) -> ScatterLayer {
    let data = records
        .par_iter()
        .enumerate()
        .map(|(index, record)| {
            let style = classify(record, &config.points);
            StyledPoint {
                index,
                position: record.position(),
                fill_color: style.fill_color,
                radius: style.radius,
            }
        })
        .collect();

    ScatterLayer {
        id: POINTS_LAYER_ID.to_string(),
        pickable: true,
        radius_units: RadiusUnits::Pixels,
        on_click: ClickAction::SelectPoint,
        data,
    }
}

pub fn layer_for(mode: ViewMode, records: &[Record], config: &AppConfig) -> LayerDescriptor {
    match mode {
        ViewMode::Heatmap => LayerDescriptor::Heatmap(heatmap_layer(records, config)),
        ViewMode::Points => LayerDescriptor::Scatter(scatter_layer(records, config)),
    }
}

pub fn tooltip_for(state: &InteractionState) -> Option<Tooltip> {
    state.selection.as_ref().map(|selection| Tooltip {
        pagos: selection.record.pagos,
        evasiones: selection.record.evasiones,
        payment_percent: selection.record.payment_percent_label(),
        screen_x: selection.screen_x,
        screen_y: selection.screen_y,
        anchor: selection.record.position(),
    })
}

pub fn compose(
    state: &InteractionState,
    records: &[Record],
    view_state: ViewState,
    base_map: &BaseMap,
    config: &AppConfig,
) -> Frame {
    Frame {
        view_state,
        controller: true,
        base_map: base_map.clone(),
        layers: vec![layer_for(state.mode, records, config)],
        toggle: ToggleControl {
            label: toggle_label(state.mode).to_string(),
        },
        tooltip: tooltip_for(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Event;

    fn records() -> Vec<Record> {
        vec![
            Record::new(-70.65, -33.44, 80, 20).with_count(100.0),
            Record::new(-70.60, -33.40, 0, 0),
            Record::new(-70.70, -33.50, 1, 3),
        ]
    }

    fn base_map() -> BaseMap {
        BaseMap {
            style: "mapbox://styles/mapbox/light-v10".to_string(),
            access_token: None,
        }
    }

    fn frame(state: &InteractionState) -> Frame {
        compose(state, &records(), ViewState::default(), &base_map(), &AppConfig::default())
    }

    fn select(index: usize, record: Record) -> Event {
        Event::SelectPoint {
            index,
            record,
            screen_x: 100.0,
            screen_y: 200.0,
        }
    }

    #[test]
    fn heatmap_mode_draws_single_heatmap_layer() {
        let frame = frame(&InteractionState::new());
        assert_eq!(frame.layers.len(), 1);
        assert_eq!(frame.layers[0].id(), HEATMAP_LAYER_ID);
        assert_eq!(frame.toggle.label, "Show points");
        assert!(frame.tooltip.is_none());
        assert!(frame.controller);

        match &frame.layers[0] {
            LayerDescriptor::Heatmap(layer) => {
                assert_eq!(layer.radius_pixels, 60.0);
                assert_eq!(layer.intensity, 1.0);
                assert_eq!(layer.threshold, 0.05);
                let weights: Vec<f64> = layer.data.iter().map(|p| p.weight).collect();
                assert_eq!(weights, vec![100.0, 0.0, 4.0]);
                assert_eq!(layer.data[2].position, [-70.70, -33.50]);
            }
            other => panic!("expected heatmap layer, got {:?}", other),
        }
    }

    #[test]
    fn points_mode_draws_classified_points() {
        let state = InteractionState::new().reduce(Event::ToggleMode);
        let frame = frame(&state);
        assert_eq!(frame.toggle.label, "Show heatmap");

        match &frame.layers[0] {
            LayerDescriptor::Scatter(layer) => {
                assert_eq!(layer.id, POINTS_LAYER_ID);
                assert!(layer.pickable);
                assert_eq!(layer.on_click, ClickAction::SelectPoint);
                let colors: Vec<Rgba> = layer.data.iter().map(|p| p.fill_color).collect();
                assert_eq!(
                    colors,
                    vec![[51, 204, 0, 200], [128, 128, 128, 200], [191, 64, 0, 200]]
                );
                assert!(layer.data.iter().enumerate().all(|(i, p)| p.index == i));
            }
            other => panic!("expected scatter layer, got {:?}", other),
        }
    }

    #[test]
    fn tooltip_shows_selected_record() {
        let state = InteractionState::new()
            .reduce(Event::ToggleMode)
            .reduce(select(0, records()[0].clone()));
        let tooltip = frame(&state).tooltip.unwrap();
        assert_eq!(tooltip.pagos, 80);
        assert_eq!(tooltip.evasiones, 20);
        assert_eq!(tooltip.payment_percent, "80.0");
        assert_eq!((tooltip.screen_x, tooltip.screen_y), (100.0, 200.0));
        assert_eq!(tooltip.anchor, [-70.65, -33.44]);
    }

    #[test]
    fn tooltip_for_empty_point_says_not_available() {
        let state = InteractionState::new()
            .reduce(Event::ToggleMode)
            .reduce(select(1, records()[1].clone()));
        assert_eq!(frame(&state).tooltip.unwrap().payment_percent, "N/A");
    }

    #[test]
    fn selection_leaves_layers_unchanged() {
        let points = InteractionState::new().reduce(Event::ToggleMode);
        let selected = points.reduce(select(2, records()[2].clone()));
        assert_eq!(frame(&points).layers, frame(&selected).layers);
    }

    #[test]
    fn composition_is_deterministic() {
        for state in [
            InteractionState::new(),
            InteractionState::new().reduce(Event::ToggleMode),
        ] {
            assert_eq!(frame(&state), frame(&state));
        }
    }

    #[test]
    fn empty_record_set_still_yields_a_layer() {
        let frame = compose(
            &InteractionState::new(),
            &[],
            ViewState::default(),
            &base_map(),
            &AppConfig::default(),
        );
        match &frame.layers[0] {
            LayerDescriptor::Heatmap(layer) => assert!(layer.data.is_empty()),
            other => panic!("expected heatmap layer, got {:?}", other),
        }
    }

    #[test]
    fn frame_serializes_with_layer_type_tag() {
        let json = serde_json::to_value(frame(&InteractionState::new())).unwrap();
        assert_eq!(json["layers"][0]["type"], "heatmap");
        assert_eq!(json["layers"][0]["id"], HEATMAP_LAYER_ID);
        assert_eq!(json["view_state"]["zoom"], 11.5);
        assert!(json["tooltip"].is_null());
        assert!(json["base_map"].get("access_token").is_none());
    }
}
