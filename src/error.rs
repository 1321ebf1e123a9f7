//! Error and skip types shared by the builder and the sampler.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal, run-level errors. Anything that can be recovered per file or per
/// town never ends up here.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("Directory {} does not exist", path.display())]
    MissingRoot { path: PathBuf },

    #[error("Failed to read config file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read directory map {}: {reason}", path.display())]
    DirectoryMap { path: PathBuf, reason: String },
}

/// A single GeoJSON file that could not be used. Recorded per town, never
/// propagated past it.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{0}")]
    Read(#[from] std::io::Error),

    #[error("{0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of the pure buffer/union/simplify step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DissolveError {
    #[error("no polygons to dissolve")]
    EmptyInput,

    #[error("polygon {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("dissolve produced an empty geometry")]
    EmptyResult,

    #[error("geometry engine panicked: {0}")]
    Engine(String),
}

/// Why a town contributed no boundary feature.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SkipReason {
    #[error("no GeoJSON files found")]
    NoGeojsonFiles,

    #[error("failed to list town directory: {0}")]
    Unreadable(String),

    #[error("no valid geometries found")]
    NoValidPolygons,

    #[error("error creating boundary: {0}")]
    Dissolve(#[from] DissolveError),
}

pub type Result<T, E = BoundaryError> = std::result::Result<T, E>;
