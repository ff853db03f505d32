//! Coverage area models.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use super::camera::CoverageParams;
use super::device::GeoPoint;

/// Shape of a camera's coverage polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaType {
    Circular,
    Directional,
}

impl std::fmt::Display for AreaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaType::Circular => write!(f, "circular"),
            AreaType::Directional => write!(f, "directional"),
        }
    }
}

/// Coverage polygon of a stored camera, ready for map display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageArea {
    pub camera_id: i64,
    pub camera_name: String,
    pub center: GeoPoint,
    pub radius: f64,
    pub field_of_view: f64,
    pub direction: f64,
    pub area_type: AreaType,
    pub coordinates: Vec<GeoPoint>,
}

impl CoverageArea {
    /// Renders the area as a GeoJSON Feature with a single polygon ring.
    ///
    /// GeoJSON positions are `[longitude, latitude]`.
    pub fn to_geojson(&self) -> JsonValue {
        let ring: Vec<[f64; 2]> = self
            .coordinates
            .iter()
            .map(|p| [p.longitude, p.latitude])
            .collect();

        json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [ring],
            },
            "properties": {
                "camera_id": self.camera_id,
                "camera_name": self.camera_name,
                "coverage_radius": self.radius,
                "field_of_view_angle": self.field_of_view,
                "coverage_direction": self.direction,
                "area_type": self.area_type.to_string(),
            },
        })
    }
}

/// Committed change of a camera's coverage parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageUpdate {
    pub camera_id: i64,
    pub previous: CoverageParams,
    pub committed: CoverageParams,
    pub area_type: AreaType,
}

/// Two cameras whose coverage circles intersect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageOverlap {
    pub camera1_id: i64,
    pub camera2_id: i64,
    pub camera1_name: String,
    pub camera2_name: String,
    /// Distance between the two camera positions in meters.
    pub distance: f64,
    /// How far the circles reach into each other, in meters.
    pub overlap_distance: f64,
    pub overlap_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_area() -> CoverageArea {
        CoverageArea {
            camera_id: 7,
            camera_name: "Lobby".to_string(),
            center: GeoPoint::new(40.0, -74.0),
            radius: 50.0,
            field_of_view: 90.0,
            direction: 45.0,
            area_type: AreaType::Directional,
            coordinates: vec![
                GeoPoint::new(40.0, -74.0),
                GeoPoint::new(40.0004, -73.9995),
                GeoPoint::new(40.0, -74.0),
            ],
        }
    }

    #[test]
    fn test_to_geojson_shape() {
        let feature = sample_area().to_geojson();
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["geometry"]["type"], "Polygon");
        let ring = feature["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 3);
        // longitude first
        assert_eq!(ring[0][0], -74.0);
        assert_eq!(ring[0][1], 40.0);
        assert_eq!(feature["properties"]["camera_id"], 7);
        assert_eq!(feature["properties"]["area_type"], "directional");
    }

    #[test]
    fn test_area_type_display() {
        assert_eq!(AreaType::Circular.to_string(), "circular");
    }
}
