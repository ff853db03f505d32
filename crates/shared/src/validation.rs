//! Coordinate and coverage parameter validation.
//!
//! Two flavours are provided. The `validate_*` helpers returning
//! [`validator::ValidationError`] plug into `#[validate(custom(...))]` on
//! request payloads. [`validate_coordinates`] and [`validate_coverage_params`]
//! return a structured [`ValidationFailure`] and are what the engine calls
//! before touching storage or computing geometry.

use serde::Serialize;
use thiserror::Error;
use validator::ValidationError;

/// Valid latitude range in decimal degrees.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Valid longitude range in decimal degrees.
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Valid coverage radius range in meters.
pub const COVERAGE_RADIUS_RANGE: (f64, f64) = (1.0, 10_000.0);

/// Valid field of view range in degrees. 360 means full circle.
pub const FIELD_OF_VIEW_RANGE: (f64, f64) = (1.0, 360.0);

/// Valid coverage direction range in compass degrees (0 = north).
pub const COVERAGE_DIRECTION_RANGE: (f64, f64) = (0.0, 359.0);

/// Structured reason a value was rejected.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("{field} must be a finite number")]
    InvalidType { field: &'static str },

    #[error("{field} {value} is out of range ({min} to {max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ValidationFailure {
    /// Name of the rejected field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationFailure::InvalidType { field } => field,
            ValidationFailure::OutOfRange { field, .. } => field,
        }
    }

    /// Whether the value was rejected for its range rather than its type.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, ValidationFailure::OutOfRange { .. })
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    range: (f64, f64),
) -> Result<(), ValidationFailure> {
    if !value.is_finite() {
        return Err(ValidationFailure::InvalidType { field });
    }
    let (min, max) = range;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationFailure::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Validates a latitude/longitude pair.
///
/// Type problems (NaN, infinities) are reported before range problems, and
/// latitude is checked before longitude.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ValidationFailure> {
    if !latitude.is_finite() {
        return Err(ValidationFailure::InvalidType { field: "latitude" });
    }
    if !longitude.is_finite() {
        return Err(ValidationFailure::InvalidType { field: "longitude" });
    }
    check_range("latitude", latitude, LATITUDE_RANGE)?;
    check_range("longitude", longitude, LONGITUDE_RANGE)
}

/// Validates camera coverage parameters.
///
/// `angle == 360` describes a full circle; `direction` is still validated in
/// that case even though geometry ignores it.
pub fn validate_coverage_params(
    radius: f64,
    angle: f64,
    direction: f64,
) -> Result<(), ValidationFailure> {
    for (field, value) in [
        ("coverage_radius", radius),
        ("field_of_view_angle", angle),
        ("coverage_direction", direction),
    ] {
        if !value.is_finite() {
            return Err(ValidationFailure::InvalidType { field });
        }
    }
    check_range("coverage_radius", radius, COVERAGE_RADIUS_RANGE)?;
    check_range("field_of_view_angle", angle, FIELD_OF_VIEW_RANGE)?;
    check_range("coverage_direction", direction, COVERAGE_DIRECTION_RANGE)
}

fn to_validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    check_range("latitude", lat, LATITUDE_RANGE)
        .map_err(|_| to_validation_error("latitude_range", "Latitude must be between -90 and 90"))
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    check_range("longitude", lon, LONGITUDE_RANGE).map_err(|_| {
        to_validation_error("longitude_range", "Longitude must be between -180 and 180")
    })
}

/// Validates that a coverage radius is within 1 to 10000 meters.
pub fn validate_coverage_radius(radius: f64) -> Result<(), ValidationError> {
    check_range("coverage_radius", radius, COVERAGE_RADIUS_RANGE).map_err(|_| {
        to_validation_error(
            "coverage_radius_range",
            "Coverage radius must be between 1 and 10000 meters",
        )
    })
}

/// Validates that a field of view is within 1 to 360 degrees.
pub fn validate_field_of_view(angle: f64) -> Result<(), ValidationError> {
    check_range("field_of_view_angle", angle, FIELD_OF_VIEW_RANGE).map_err(|_| {
        to_validation_error(
            "field_of_view_range",
            "Field of view must be between 1 and 360 degrees",
        )
    })
}

/// Validates that a coverage direction is within 0 to 359 degrees.
pub fn validate_coverage_direction(direction: f64) -> Result<(), ValidationError> {
    check_range("coverage_direction", direction, COVERAGE_DIRECTION_RANGE).map_err(|_| {
        to_validation_error(
            "coverage_direction_range",
            "Coverage direction must be between 0 and 359 degrees",
        )
    })
}
