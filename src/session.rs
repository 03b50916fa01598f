//! Single-threaded UI loop.
//!
//! The session starts with an empty record set, kicks off the initial fetch in the
//! background and applies user commands as they arrive on its input, one line each.
//! Every applied event emits the composed frame as one JSON line.

use crate::compose::{compose, BaseMap, Frame};
use crate::config::AppConfig;
use crate::data;
use crate::interaction::{Event, InteractionState};
use crate::pick::PointIndex;
use crate::types::{Record, ViewMode};
use crate::viewport::Viewport;
use anyhow::{Context, Result};
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Toggle,
    Select { index: usize, x: f64, y: f64 },
    Click { x: f64, y: f64 },
    Clear,
    Frame,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    Arguments {
        command: &'static str,
        expected: &'static str,
    },
    #[error("no record at index {0}")]
    NoSuchRecord(usize),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = parts.collect();

        match name.to_ascii_lowercase().as_str() {
            "toggle" => Ok(Command::Toggle),
            "clear" | "escape" | "esc" => Ok(Command::Clear),
            "frame" => Ok(Command::Frame),
            "select" => match args.as_slice() {
                [index, x, y] => Ok(Command::Select {
                    index: index.parse().map_err(|_| select_usage())?,
                    x: screen_coordinate(x).ok_or_else(select_usage)?,
                    y: screen_coordinate(y).ok_or_else(select_usage)?,
                }),
                _ => Err(select_usage()),
            },
            "click" => match args.as_slice() {
                [x, y] => Ok(Command::Click {
                    x: screen_coordinate(x).ok_or_else(click_usage)?,
                    y: screen_coordinate(y).ok_or_else(click_usage)?,
                }),
                _ => Err(click_usage()),
            },
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

// Screen positions must be finite: NaN or inf would end up in the tooltip
fn screen_coordinate(arg: &str) -> Option<f64> {
    arg.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn select_usage() -> CommandError {
    CommandError::Arguments {
        command: "select",
        expected: "<index> <x> <y>",
    }
}

fn click_usage() -> CommandError {
    CommandError::Arguments {
        command: "click",
        expected: "<x> <y>",
    }
}

pub struct Session {
    config: AppConfig,
    base_map: BaseMap,
    records: Vec<Record>,
    index: PointIndex,
    state: InteractionState,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        let base_map = BaseMap {
            style: config.map.style.clone(),
            access_token: config.access_token(),
        };
        Self::with_base_map(config, base_map)
    }

    pub fn with_base_map(config: AppConfig, base_map: BaseMap) -> Self {
        Self {
            config,
            base_map,
            records: Vec::new(),
            index: PointIndex::build(&[]),
            state: InteractionState::new(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            self.config.map.initial_view,
            self.config.map.width,
            self.config.map.height,
        )
    }

    /// Replaces the record set in one step. Any open tooltip refers to the old set and is closed.
    pub fn load(&mut self, records: Vec<Record>) {
        info!(count = records.len(), "record set replaced");
        self.index = PointIndex::build(&records);
        self.records = records;
        self.state = self.state.reduce(Event::ClearSelection);
    }

    pub fn dispatch(&mut self, event: Event) {
        self.state = self.state.reduce(event);
    }

    pub fn apply(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Toggle => self.dispatch(Event::ToggleMode),
            Command::Clear => self.dispatch(Event::ClearSelection),
            Command::Frame => {}
            Command::Select { index, x, y } => {
                let record = self
                    .records
                    .get(index)
                    .cloned()
                    .ok_or(CommandError::NoSuchRecord(index))?;
                self.dispatch(Event::SelectPoint {
                    index,
                    record,
                    screen_x: x,
                    screen_y: y,
                });
            }
            Command::Click { x, y } => {
                if self.state.mode != ViewMode::Points {
                    debug!(x, y, "click ignored in heatmap mode");
                    return Ok(());
                }
                let hit = self
                    .index
                    .pick(&self.viewport(), x, y, self.config.points.radius);
                match hit.and_then(|i| self.records.get(i).cloned().map(|r| (i, r))) {
                    Some((index, record)) => self.dispatch(Event::SelectPoint {
                        index,
                        record,
                        screen_x: x,
                        screen_y: y,
                    }),
                    // Clicking empty map closes the tooltip
                    None => self.dispatch(Event::ClearSelection),
                }
            }
        }
        Ok(())
    }

    pub fn frame(&self) -> Frame {
        compose(
            &self.state,
            &self.records,
            self.config.map.initial_view,
            &self.base_map,
            &self.config,
        )
    }

    pub fn emit<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer(&mut *out, &self.frame()).context("Failed to serialize frame")?;
        writeln!(out).context("Failed to write frame")?;
        out.flush().context("Failed to flush frame output")?;
        Ok(())
    }
}

/// Runs the event loop until `input` is exhausted.
pub async fn run<R, W>(config: AppConfig, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = Session::new(config.clone());
    let mut fetch = tokio::spawn(data::load_records_or_empty(config.data.clone()));
    let mut fetched = false;
    let mut lines = input.lines();

    // Renders before the fetch completes see an empty record set
    session.emit(&mut output)?;

    loop {
        tokio::select! {
            loaded = &mut fetch, if !fetched => {
                fetched = true;
                let records = loaded.unwrap_or_else(|e| {
                    warn!(error = %e, "data fetch task failed");
                    Vec::new()
                });
                session.load(records);
                session.emit(&mut output)?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read command input")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>().and_then(|command| session.apply(command)) {
                    Ok(()) => session.emit(&mut output)?,
                    Err(e) => warn!(command = %line.trim(), error = %e, "ignoring command"),
                }
            }
        }
    }

    if !fetched {
        fetch.abort();
    }
    Ok(())
}
