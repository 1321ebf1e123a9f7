//! Buffer, union and simplify a set of polygons into one outline.

use std::panic::{self, AssertUnwindSafe};

use geo::{unary_union, Buffer, MultiPolygon, Polygon, Simplify};

use crate::error::DissolveError;

/// Dissolve `polygons` into a single (multi)polygon.
///
/// Every polygon is first grown by `buffer_margin` so that slivers between
/// neighbouring parcels close up, then everything is unioned and the result
/// is simplified with `simplify_tolerance`. Disconnected parts stay separate
/// members of the returned MultiPolygon.
pub fn dissolve(
    polygons: &[Polygon<f64>],
    buffer_margin: f64,
    simplify_tolerance: f64,
) -> Result<MultiPolygon<f64>, DissolveError> {
    if polygons.is_empty() {
        return Err(DissolveError::EmptyInput);
    }

    if let Some(index) = polygons.iter().position(|p| !is_finite(p)) {
        return Err(DissolveError::NonFinite { index });
    }

    // The boolean-ops engine can panic on pathological input; keep that
    // contained to the town being built.
    let simplified = panic::catch_unwind(AssertUnwindSafe(|| {
        let buffered: Vec<Polygon<f64>> = polygons
            .iter()
            .flat_map(|p| grow(p, buffer_margin).0)
            .collect();

        unary_union(&buffered).simplify(simplify_tolerance)
    }))
    .map_err(|payload| DissolveError::Engine(panic_message(payload.as_ref())))?;

    let members: Vec<Polygon<f64>> = simplified
        .into_iter()
        .filter(|p| p.exterior().0.len() >= 4)
        .collect();

    if members.is_empty() {
        return Err(DissolveError::EmptyResult);
    }

    Ok(MultiPolygon::new(members))
}

/// Buffer one polygon after resolving self-intersections, so a bowtie
/// ring keeps both lobes instead of buffering to nothing.
fn grow(polygon: &Polygon<f64>, margin: f64) -> MultiPolygon<f64> {
    let cleaned = unary_union(std::slice::from_ref(polygon));
    if margin > 0.0 {
        cleaned.buffer(margin)
    } else {
        cleaned
    }
}

fn is_finite(polygon: &Polygon<f64>) -> bool {
    polygon
        .exterior()
        .coords()
        .chain(polygon.interiors().iter().flat_map(|r| r.coords()))
        .all(|c| c.x.is_finite() && c.y.is_finite())
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
