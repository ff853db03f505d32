//! Camera entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Camera, CoverageParams, LocationSource};
use sqlx::FromRow;

/// Database row mapping for the cameras table.
#[derive(Debug, Clone, FromRow)]
pub struct CameraEntity {
    pub id: i64,
    pub default_name: String,
    pub custom_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub dvr_id: Option<i64>,
    pub coverage_radius: f64,
    pub field_of_view_angle: f64,
    pub coverage_direction: f64,
    pub location_source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CameraEntity> for Camera {
    fn from(entity: CameraEntity) -> Self {
        Self {
            id: entity.id,
            default_name: entity.default_name,
            custom_name: entity.custom_name,
            latitude: entity.latitude,
            longitude: entity.longitude,
            dvr_id: entity.dvr_id,
            coverage: CoverageParams::new(
                entity.coverage_radius,
                entity.field_of_view_angle,
                entity.coverage_direction,
            ),
            location_source: LocationSource::parse(&entity.location_source).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::Device;

    fn create_test_camera_entity() -> CameraEntity {
        CameraEntity {
            id: 4,
            default_name: "CAM-04".to_string(),
            custom_name: Some("Loading dock".to_string()),
            latitude: Some(40.0),
            longitude: Some(-74.0),
            dvr_id: Some(2),
            coverage_radius: 80.0,
            field_of_view_angle: 90.0,
            coverage_direction: 270.0,
            location_source: "inherited".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_camera_entity_to_domain() {
        let camera: Camera = create_test_camera_entity().into();
        assert_eq!(camera.id, 4);
        assert_eq!(camera.display_name(), "Loading dock");
        assert_eq!(camera.dvr_id, Some(2));
        assert_eq!(camera.coverage, CoverageParams::new(80.0, 90.0, 270.0));
        assert_eq!(camera.location_source, LocationSource::Inherited);
        assert!(camera.is_positioned());
    }

    #[test]
    fn test_unknown_location_source_reads_as_explicit() {
        let mut entity = create_test_camera_entity();
        entity.location_source = "legacy".to_string();
        let camera: Camera = entity.into();
        assert_eq!(camera.location_source, LocationSource::Explicit);
    }

    #[test]
    fn test_half_missing_position_is_unpositioned() {
        let mut entity = create_test_camera_entity();
        entity.longitude = None;
        let camera: Camera = entity.into();
        assert!(!camera.is_positioned());
    }
}
