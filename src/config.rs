use crate::classify::{Rgba, WeightSource};
use crate::viewport::ViewState;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub map: MapConfig,
    pub heatmap: HeatmapConfig,
    pub points: PointsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub source: String, // http(s) URL or local path
    pub timeout_secs: u64,
    pub retries: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: "data.json".to_string(),
            timeout_secs: 10,
            retries: 0,
        }
    }
}

impl DataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub style: String,
    pub token_env: String, // name of the env var holding the tile provider credential
    pub width: f64,
    pub height: f64,
    pub initial_view: ViewState,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            style: "mapbox://styles/mapbox/light-v10".to_string(),
            token_env: "MAPBOX_TOKEN".to_string(),
            width: 1280.0,
            height: 800.0,
            initial_view: ViewState::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HeatmapConfig {
    pub radius_pixels: f64,
    pub intensity: f64,
    pub threshold: f64,
    pub weight: WeightSource,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            radius_pixels: 60.0,
            intensity: 1.0,
            threshold: 0.05,
            weight: WeightSource::Count,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PointsConfig {
    pub radius: f64,
    pub fallback_color: Rgba,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            radius: 6.0,
            fallback_color: [128, 128, 128, 200],
        }
    }
}

/// Tile provider credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Reads the map credential from the environment variable named by `token_env`.
    pub fn access_token(&self) -> Option<AccessToken> {
        match std::env::var(&self.map.token_env) {
            Ok(token) if !token.trim().is_empty() => Some(AccessToken::new(token)),
            _ => {
                warn!(var = %self.map.token_env, "map access token not set; base map tiles may not load");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.data.source, "data.json");
        assert_eq!(config.data.timeout(), Duration::from_secs(10));
        assert_eq!(config.data.retries, 0);
        assert_eq!(config.map.style, "mapbox://styles/mapbox/light-v10");
        assert_eq!(config.map.initial_view.longitude, -70.6693);
        assert_eq!(config.map.initial_view.latitude, -33.4489);
        assert_eq!(config.map.initial_view.zoom, 11.5);
        assert_eq!(config.heatmap.radius_pixels, 60.0);
        assert_eq!(config.heatmap.threshold, 0.05);
        assert_eq!(config.heatmap.weight, WeightSource::Count);
        assert_eq!(config.points.fallback_color, [128, 128, 128, 200]);
    }

    #[test]
    fn partial_sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [data]
            source = "https://example.org/data.json"
            retries = 2

            [heatmap]
            weight = "evasiones"

            [map.initial_view]
            zoom = 9.0
            "#,
        )
        .unwrap();

        assert_eq!(config.data.source, "https://example.org/data.json");
        assert_eq!(config.data.retries, 2);
        assert_eq!(config.data.timeout_secs, 10);
        assert_eq!(config.heatmap.weight, WeightSource::Evasiones);
        assert_eq!(config.heatmap.radius_pixels, 60.0);
        assert_eq!(config.map.initial_view.zoom, 9.0);
        assert_eq!(config.map.initial_view.longitude, -70.6693);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(AppConfig::from_toml("[data\nsource = 1").is_err());
    }

    #[test]
    fn access_token_is_redacted_in_debug() {
        let token = AccessToken::new("pk.secret");
        assert_eq!(format!("{:?}", token), "AccessToken(***)");
        assert_eq!(token.expose(), "pk.secret");
    }

    #[test]
    fn missing_token_env_yields_none() {
        let mut config = AppConfig::default();
        config.map.token_env = "EVASION_MAP_TEST_TOKEN_THAT_IS_NEVER_SET".to_string();
        assert!(config.access_token().is_none());
    }
}
