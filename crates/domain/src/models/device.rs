//! Device capability shared by cameras and DVRs.

use serde::{Deserialize, Serialize};
use shared::validation::{validate_coordinates, ValidationFailure};

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a point after checking both coordinates.
    pub fn validated(latitude: f64, longitude: f64) -> Result<Self, ValidationFailure> {
        validate_coordinates(latitude, longitude)?;
        Ok(Self::new(latitude, longitude))
    }

    /// Pairs optional columns into a point; either half missing means unpositioned.
    pub fn from_columns(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Self::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Converts into a `geo` point (x = longitude, y = latitude).
    pub fn to_geo(self) -> geo::Point<f64> {
        geo::Point::new(self.longitude, self.latitude)
    }
}

/// Which table a device lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Camera,
    Dvr,
}

impl DeviceKind {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Camera => "camera",
            DeviceKind::Dvr => "dvr",
        }
    }

    /// Parses from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "camera" => Some(DeviceKind::Camera),
            "dvr" => Some(DeviceKind::Dvr),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a device record.
///
/// Cameras and DVRs have independent id spaces, so the kind is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRef {
    pub kind: DeviceKind,
    pub id: i64,
}

impl DeviceRef {
    pub fn camera(id: i64) -> Self {
        Self {
            kind: DeviceKind::Camera,
            id,
        }
    }

    pub fn dvr(id: i64) -> Self {
        Self {
            kind: DeviceKind::Dvr,
            id,
        }
    }
}

impl std::fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Behaviour shared by every positioned device.
pub trait Device {
    fn device_ref(&self) -> DeviceRef;

    fn position(&self) -> Option<GeoPoint>;

    fn custom_name(&self) -> Option<&str>;

    fn default_name(&self) -> &str;

    /// Resolved display name: custom name, else default name, else a
    /// kind-and-id label. Never empty.
    fn display_name(&self) -> String {
        if let Some(name) = self.custom_name().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let default = self.default_name().trim();
        if !default.is_empty() {
            return default.to_string();
        }
        let device = self.device_ref();
        match device.kind {
            DeviceKind::Camera => format!("Camera {}", device.id),
            DeviceKind::Dvr => format!("DVR {}", device.id),
        }
    }

    fn is_positioned(&self) -> bool {
        self.position().is_some()
    }
}
