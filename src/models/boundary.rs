//! Output feature for a dissolved town outline.

use geo::MultiPolygon;
use geojson::{Feature, Geometry, JsonObject, Value};
use serde_json::json;

/// A town outline with its labels, ready to be written as a GeoJSON feature
#[derive(Debug, Clone)]
pub struct TownBoundary {
    pub town_id: String,
    pub name: String,
    /// False when only no-data placeholders were available
    pub has_noise_data: bool,
    pub geometry: MultiPolygon<f64>,
}

impl TownBoundary {
    pub fn properties(&self) -> JsonObject {
        let mut props = JsonObject::new();
        props.insert("TOWN_ID".to_string(), json!(self.town_id));
        props.insert("NAME".to_string(), json!(self.name));
        props.insert("HAS_NOISE_DATA".to_string(), json!(self.has_noise_data));
        // No-data placeholders still count as data
        props.insert("HAS_DATA".to_string(), json!(true));
        props
    }

    /// GeoJSON geometry; a single-member result is written as a Polygon.
    pub fn geojson_geometry(&self) -> Geometry {
        let value = match self.geometry.0.as_slice() {
            [single] => Value::from(single),
            _ => Value::from(&self.geometry),
        };
        Geometry::new(value)
    }

    pub fn to_feature(&self) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(self.geojson_geometry()),
            id: None,
            properties: Some(self.properties()),
            foreign_members: None,
        }
    }
}
