//! Core data models for the boundary builder and sampler.

pub mod boundary;
pub mod town;

pub use boundary::TownBoundary;
pub use town::{display_name, noise_level, FileKind, Town, TownFiles};
