//! DVR domain model.

use serde::{Deserialize, Serialize};

use super::device::{Device, DeviceRef, GeoPoint};

/// Represents a DVR recorder that cameras can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dvr {
    pub id: i64,
    pub default_name: String,
    pub custom_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Dvr {
    pub fn new(id: i64, default_name: impl Into<String>) -> Self {
        Self {
            id,
            default_name: default_name.into(),
            custom_name: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_custom_name(mut self, name: impl Into<String>) -> Self {
        self.custom_name = Some(name.into());
        self
    }
}

impl Device for Dvr {
    fn device_ref(&self) -> DeviceRef {
        DeviceRef::dvr(self.id)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dvr_display_name() {
        assert_eq!(Dvr::new(1, "DVR-192-168-1-10").display_name(), "DVR-192-168-1-10");
        assert_eq!(
            Dvr::new(1, "DVR-192-168-1-10")
                .with_custom_name("Warehouse")
                .display_name(),
            "Warehouse"
        );
        assert_eq!(Dvr::new(9, " ").display_name(), "DVR 9");
    }

    #[test]
    fn test_dvr_position() {
        let dvr = Dvr::new(1, "dvr").with_position(40.0, -74.0);
        assert_eq!(dvr.position(), Some(GeoPoint::new(40.0, -74.0)));
        assert_eq!(dvr.device_ref(), DeviceRef::dvr(1));
    }
}
