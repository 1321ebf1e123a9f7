//! Reduces raw GeoJSON features to simple polygons.
//!
//! Only the first ring of a Polygon (and of each MultiPolygon member) is
//! kept, so interior holes are filled in. Points become small squares.
//! Anything else, or a feature without usable coordinates, yields nothing.

use geo::{Coord, LineString, Polygon};
use geojson::Value;
use serde_json::Value as JsonValue;

/// Extract normalized polygons from one raw feature object.
///
/// The feature is consumed so its geometry can be handed to the GeoJSON
/// parser without copying.
pub fn feature_polygons(feature: JsonValue, point_margin: f64) -> Vec<Polygon<f64>> {
    let JsonValue::Object(mut feature) = feature else {
        return Vec::new();
    };

    let geometry = match feature.remove("geometry") {
        Some(g @ JsonValue::Object(_)) => g,
        _ => return Vec::new(),
    };

    if !has_coordinates(&geometry) {
        return Vec::new();
    }

    match geojson::Geometry::from_json_value(geometry) {
        Ok(geometry) => normalize(&geometry.value, point_margin),
        Err(_) => Vec::new(),
    }
}

/// True when the geometry carries a non-empty `coordinates` member.
fn has_coordinates(geometry: &JsonValue) -> bool {
    match geometry.get("coordinates") {
        Some(JsonValue::Array(coords)) => !coords.is_empty(),
        _ => false,
    }
}

pub fn normalize(value: &Value, point_margin: f64) -> Vec<Polygon<f64>> {
    match value {
        Value::Polygon(rings) => rings.first().and_then(|r| ring_polygon(r)).into_iter().collect(),
        Value::MultiPolygon(members) => members
            .iter()
            .filter_map(|rings| rings.first().and_then(|r| ring_polygon(r)))
            .collect(),
        Value::Point(position) => match position.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => {
                vec![point_square(*x, *y, point_margin)]
            }
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Axis-aligned square of half-width `margin` centred on (x, y), as a closed
/// five-vertex ring.
pub fn point_square(x: f64, y: f64, margin: f64) -> Polygon<f64> {
    let ring = vec![
        Coord { x: x - margin, y: y - margin },
        Coord { x: x + margin, y: y - margin },
        Coord { x: x + margin, y: y + margin },
        Coord { x: x - margin, y: y + margin },
        Coord { x: x - margin, y: y - margin },
    ];
    Polygon::new(LineString::new(ring), vec![])
}

/// Build a polygon from one GeoJSON ring, closing it if needed.
fn ring_polygon(positions: &[Vec<f64>]) -> Option<Polygon<f64>> {
    let coords: Vec<Coord<f64>> = positions
        .iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect();

    if coords.len() < 3 {
        return None;
    }

    let mut ring = coords;
    if ring.first() != ring.last() {
        ring.push(ring[0]);
    }

    if ring.len() < 4 {
        return None;
    }

    Some(Polygon::new(LineString::new(ring), vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MARGIN: f64 = 0.001;

    #[test]
    fn test_point_becomes_square() {
        let polys = feature_polygons(
            json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [-71.3, 42.4]}}),
            MARGIN,
        );
        assert_eq!(polys.len(), 1);

        let ring: Vec<_> = polys[0].exterior().coords().copied().collect();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring[0], Coord { x: -71.3 - MARGIN, y: 42.4 - MARGIN });
        assert_eq!(ring[1], Coord { x: -71.3 + MARGIN, y: 42.4 - MARGIN });
        assert_eq!(ring[2], Coord { x: -71.3 + MARGIN, y: 42.4 + MARGIN });
        assert_eq!(ring[3], Coord { x: -71.3 - MARGIN, y: 42.4 + MARGIN });
    }

    #[test]
    fn test_polygon_keeps_only_first_ring() {
        let polys = feature_polygons(
            json!({"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [
                [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0], [1.0, 1.0]]
            ]}}),
            MARGIN,
        );
        assert_eq!(polys.len(), 1);
        assert!(polys[0].interiors().is_empty());
        assert_eq!(polys[0].exterior().0.len(), 5);
    }

    #[test]
    fn test_multipolygon_one_per_member() {
        let polys = feature_polygons(
            json!({"type": "Feature", "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                [[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]],
                []
            ]}}),
            MARGIN,
        );
        assert_eq!(polys.len(), 2);
    }

    #[test]
    fn test_open_ring_is_closed() {
        let polys = normalize(
            &Value::Polygon(vec![vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]]]),
            MARGIN,
        );
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].exterior().0.len(), 4);
    }

    #[test]
    fn test_degenerate_ring_skipped() {
        let polys = normalize(&Value::Polygon(vec![vec![vec![0.0, 0.0], vec![1.0, 0.0]]]), MARGIN);
        assert!(polys.is_empty());
    }

    #[test]
    fn test_missing_or_empty_geometry_skipped() {
        let cases = [
            json!({"type": "Feature", "properties": {}}),
            json!({"type": "Feature", "geometry": null}),
            json!({"type": "Feature", "geometry": {"type": "Polygon"}}),
            json!({"type": "Feature", "geometry": {"type": "Polygon", "coordinates": []}}),
            json!({"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}}),
            json!("not a feature"),
        ];
        for case in cases {
            assert!(feature_polygons(case.clone(), MARGIN).is_empty(), "{case}");
        }
    }
}
