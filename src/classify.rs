//! Visual encoding of records.
//!
//! Point mode colours each record on a straight green-to-red ramp by its
//! evasion rate. Heatmap mode only needs a scalar weight; density estimation
//! is left to the rendering engine.

use crate::config::PointsConfig;
use crate::types::Record;
use serde::{Deserialize, Serialize};

/// RGBA colour, 0..=255 per channel.
pub type Rgba = [u8; 4];

pub const POINT_ALPHA: u8 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointStyle {
    pub fill_color: Rgba,
    pub radius: f64,
}

/// Which record field drives the heatmap density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightSource {
    #[default]
    Count,
    Evasiones,
}

/// Colour for an evasion rate in [0, 1]: 0 is pure green, 1 is pure red.
pub fn rate_color(rate: f64) -> Rgba {
    let rate = rate.clamp(0.0, 1.0);
    let red = (255.0 * rate).round() as u8;
    let green = (255.0 * (1.0 - rate)).round() as u8;
    [red, green, 0, POINT_ALPHA]
}

pub fn classify(record: &Record, points: &PointsConfig) -> PointStyle {
    // Points with no events get the fallback instead of a NaN-derived colour
    let fill_color = match record.evasion_rate() {
        Some(rate) => rate_color(rate),
        None => points.fallback_color,
    };

    PointStyle {
        fill_color,
        radius: points.radius,
    }
}

pub fn weight(record: &Record, source: WeightSource) -> f64 {
    match source {
        WeightSource::Count => record.count_or_total(),
        WeightSource::Evasiones => record.evasiones as f64,
    }
}
