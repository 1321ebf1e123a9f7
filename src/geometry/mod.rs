//! Geometry normalization and dissolving.

mod dissolve;
mod normalize;

pub use dissolve::dissolve;
pub use normalize::{feature_polygons, normalize, point_square};
