//! Camera domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::coverage::AreaType;
use super::device::{Device, DeviceRef, GeoPoint};

/// Default coverage radius in meters for a newly registered camera.
pub const DEFAULT_COVERAGE_RADIUS: f64 = 50.0;

/// Default field of view in degrees (full circle).
pub const DEFAULT_FIELD_OF_VIEW: f64 = 360.0;

/// Default coverage direction in degrees (north).
pub const DEFAULT_COVERAGE_DIRECTION: f64 = 0.0;

/// Where a camera's coordinates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// Set directly by an operator.
    #[default]
    Explicit,
    /// Copied from the owning DVR.
    Inherited,
}

impl LocationSource {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationSource::Explicit => "explicit",
            LocationSource::Inherited => "inherited",
        }
    }

    /// Parses from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "explicit" => Some(LocationSource::Explicit),
            "inherited" => Some(LocationSource::Inherited),
            _ => None,
        }
    }
}

impl std::fmt::Display for LocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor coverage parameters of a camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CoverageParams {
    #[validate(custom(function = "shared::validation::validate_coverage_radius"))]
    pub radius: f64,

    #[validate(custom(function = "shared::validation::validate_field_of_view"))]
    pub field_of_view: f64,

    #[validate(custom(function = "shared::validation::validate_coverage_direction"))]
    pub direction: f64,
}

impl CoverageParams {
    pub fn new(radius: f64, field_of_view: f64, direction: f64) -> Self {
        Self {
            radius,
            field_of_view,
            direction,
        }
    }

    /// Whether the camera sees all around itself.
    pub fn is_full_circle(&self) -> bool {
        self.field_of_view >= 360.0
    }

    pub fn area_type(&self) -> AreaType {
        if self.is_full_circle() {
            AreaType::Circular
        } else {
            AreaType::Directional
        }
    }
}

impl Default for CoverageParams {
    fn default() -> Self {
        Self::new(
            DEFAULT_COVERAGE_RADIUS,
            DEFAULT_FIELD_OF_VIEW,
            DEFAULT_COVERAGE_DIRECTION,
        )
    }
}

/// Represents a camera placed (or waiting to be placed) on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub id: i64,
    pub default_name: String,
    pub custom_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub dvr_id: Option<i64>,
    pub coverage: CoverageParams,
    pub location_source: LocationSource,
}

impl Camera {
    /// An unpositioned, unassigned camera with default coverage.
    pub fn new(id: i64, default_name: impl Into<String>) -> Self {
        Self {
            id,
            default_name: default_name.into(),
            custom_name: None,
            latitude: None,
            longitude: None,
            dvr_id: None,
            coverage: CoverageParams::default(),
            location_source: LocationSource::Explicit,
        }
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_coverage(mut self, coverage: CoverageParams) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_custom_name(mut self, name: impl Into<String>) -> Self {
        self.custom_name = Some(name.into());
        self
    }

    /// Whether coordinates currently track the owning DVR.
    pub fn is_inherited(&self) -> bool {
        self.location_source == LocationSource::Inherited
    }

    /// Whether a non-forced inherited write may overwrite the position.
    ///
    /// Unpositioned cameras have no operator placement to protect, so they
    /// take the DVR position whatever their tag.
    pub fn accepts_inherited_position(&self) -> bool {
        self.position().is_none() || self.is_inherited()
    }
}

impl Device for Camera {
    fn device_ref(&self) -> DeviceRef {
        DeviceRef::camera(self.id)
    }

    fn position(&self) -> Option<GeoPoint> {
        GeoPoint::from_columns(self.latitude, self.longitude)
    }

    fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    fn default_name(&self) -> &str {
        &self.default_name
    }
}
