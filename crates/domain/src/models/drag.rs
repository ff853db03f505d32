//! Drag-and-drop request payloads sent by the map UI.

use serde::Deserialize;
use validator::Validate;

use super::device::DeviceRef;

/// Position carried by a drag request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct DragPosition {
    #[validate(range(min = 1, message = "Device id must be positive"))]
    pub device_id: i64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,
}

/// Request emitted when a marker is dropped on the map.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DragRequest {
    UpdateCameraPosition(DragPosition),
    UpdateDvrPosition(DragPosition),
}

impl DragRequest {
    pub fn device(&self) -> DeviceRef {
        match self {
            DragRequest::UpdateCameraPosition(p) => DeviceRef::camera(p.device_id),
            DragRequest::UpdateDvrPosition(p) => DeviceRef::dvr(p.device_id),
        }
    }

    pub fn position(&self) -> &DragPosition {
        match self {
            DragRequest::UpdateCameraPosition(p) | DragRequest::UpdateDvrPosition(p) => p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_camera_drag() {
        let request: DragRequest = serde_json::from_value(json!({
            "action": "update_camera_position",
            "device_id": 12,
            "latitude": 40.5,
            "longitude": -73.9,
        }))
        .unwrap();
        assert_eq!(request.device(), DeviceRef::camera(12));
        assert_eq!(request.position().latitude, 40.5);
        assert!(request.position().validate().is_ok());
    }

    #[test]
    fn test_deserialize_dvr_drag() {
        let request: DragRequest = serde_json::from_value(json!({
            "action": "update_dvr_position",
            "device_id": 2,
            "latitude": 0.0,
            "longitude": 0.0,
        }))
        .unwrap();
        assert_eq!(request.device(), DeviceRef::dvr(2));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<DragRequest, _> = serde_json::from_value(json!({
            "action": "delete_camera",
            "device_id": 1,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let position = DragPosition {
            device_id: 0,
            latitude: 95.0,
            longitude: 10.0,
        };
        let errors = position.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("device_id"));
        assert!(fields.contains_key("latitude"));
        assert!(!fields.contains_key("longitude"));
    }
}
