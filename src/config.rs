use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{BoundaryError, Result};

/// Relative path from the data root to the per-town directories.
pub const TOWNS_SUBDIR: &str = "parcels/noise_by_town";

/// Index file the sampler reads from the noise directory.
pub const DIRECTORY_MAP_FILE: &str = "directory_map.json";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub boundaries: BoundaryConfig,
    pub sampler: SamplerConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Outward buffer applied to every polygon before union
    pub buffer_margin: f64,
    /// Douglas-Peucker tolerance for the dissolved outline
    pub simplify_tolerance: f64,
    /// Half-width of the square a Point is expanded into
    pub point_margin: f64,
    /// Files starting with this prefix are placeholders without noise data
    pub no_data_prefix: String,
    pub extension: String,
    /// Process towns on the rayon thread pool
    pub parallel: bool,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            buffer_margin: 0.001,
            simplify_tolerance: 0.001,
            point_margin: 0.001,
            no_data_prefix: "No_Data".to_string(),
            extension: "geojson".to_string(),
            parallel: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    /// Max features kept per noise file
    pub per_file: usize,
    /// Write a snapshot every N towns (0 disables snapshots)
    pub progress_every: usize,
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            per_file: 10,
            progress_every: 20,
            seed: None,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| BoundaryError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| BoundaryError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if given, otherwise fall back to the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }
}
