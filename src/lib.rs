//! Noisemap - town outlines and a sampled noise layer from per-town
//! parcel noise contours.
//!
//! This library provides shared types and modules for the boundaries and sample binaries.

pub mod builder;
pub mod config;
pub mod discovery;
pub mod error;
pub mod geometry;
pub mod models;
pub mod output;
pub mod sampler;

pub use builder::{BoundaryBuilder, RunReport, TownOutcome, TownResult};
pub use config::Config;
pub use error::{BoundaryError, DissolveError, SkipReason};
pub use sampler::{SampleStats, Sampler};
