//! Configuration schema and loading.
//!
//! Carcamp is configured via a TOML file at `<data dir>/carcamp.toml`.
//! Every key is optional; a missing file yields the defaults. The Mapbox
//! access token can also come from `CARCAMP_MAPBOX_TOKEN` so it never has
//! to be written to disk.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable overriding `mapbox.access_token`.
pub const TOKEN_ENV: &str = "CARCAMP_MAPBOX_TOKEN";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CarcampConfig {
    pub mapbox: MapboxConfig,
    pub graph: GraphConfig,
    pub jobs: JobConfig,
}

/// Mapbox API settings (distance matrix and datasets).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapboxConfig {
    /// API root, without trailing slash.
    pub base_url: String,
    pub access_token: Option<String>,
    /// Account that owns the feature dataset.
    pub owner: Option<String>,
    pub dataset_id: Option<String>,
    /// Maximum coordinates per matrix request, origin included.
    pub max_coordinates: usize,
    /// Optional HTTP timeout. None leaves requests unbounded.
    pub timeout_secs: Option<u64>,
}

impl Default for MapboxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mapbox.com".to_string(),
            access_token: None,
            owner: None,
            dataset_id: None,
            max_coordinates: 25,
            timeout_secs: None,
        }
    }
}

impl MapboxConfig {
    /// Destinations per matrix request: the coordinate limit minus the origin.
    pub fn group_size(&self) -> usize {
        self.max_coordinates.saturating_sub(1).max(1)
    }
}

/// Proximity graph settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum great-circle distance for two spots to be connected.
    pub threshold_meters: f64,
    /// Geohash prefix length of the cells searched for candidates.
    pub cell_precision: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            threshold_meters: 10_000.0,
            cell_precision: carcamp_geo::geohash::NEIGHBOR_PRECISION,
        }
    }
}

/// Bulk job settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Spots rebuilt at the same time. 1 runs strictly in sequence.
    pub concurrency: usize,
    /// Spots fetched per page when scanning the whole store.
    pub page_size: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            page_size: 100,
        }
    }
}

impl CarcampConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.mapbox.access_token = Some(token.trim().to_string());
            }
        }
    }
}
