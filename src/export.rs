use crate::classify::{classify, weight};
use crate::config::AppConfig;
use crate::types::Record;
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;

/// Every record as a styled GeoJSON point, for engines that take GeoJSON sources.
pub fn to_feature_collection(records: &[Record], config: &AppConfig) -> FeatureCollection {
    let features = records
        .iter()
        .map(|record| {
            let style = classify(record, &config.points);

            let mut properties = JsonObject::new();
            properties.insert("pagos".to_string(), json!(record.pagos));
            properties.insert("evasiones".to_string(), json!(record.evasiones));
            properties.insert(
                "weight".to_string(),
                json!(weight(record, config.heatmap.weight)),
            );
            properties.insert("fill_color".to_string(), json!(style.fill_color));
            properties.insert("radius".to_string(), json!(style.radius));
            properties.insert(
                "payment_percent".to_string(),
                json!(record.payment_percent_label()),
            );

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::from(&record.point()))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_geojson(records: &[Record], config: &AppConfig, path: &Path) -> Result<()> {
    let geojson = GeoJson::FeatureCollection(to_feature_collection(records, config));
    fs::write(path, geojson.to_string())
        .with_context(|| format!("Failed to write GeoJSON: {:?}", path))?;
    info!(path = ?path, features = records.len(), "wrote GeoJSON export");
    Ok(())
}
