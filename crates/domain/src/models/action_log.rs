//! Action log domain models.
//!
//! Every position, coverage or assignment mutation appends one entry inside
//! the transaction that performs it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use super::camera::CoverageParams;
use super::device::{DeviceKind, DeviceRef, GeoPoint};

/// Kinds of recorded actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CoordinateUpdate,
    DvrCoordinateUpdate,
    CameraAssignment,
    CameraUnassignment,
    CoverageUpdate,
}

impl ActionType {
    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CoordinateUpdate => "coordinate_update",
            ActionType::DvrCoordinateUpdate => "dvr_coordinate_update",
            ActionType::CameraAssignment => "camera_assignment",
            ActionType::CameraUnassignment => "camera_unassignment",
            ActionType::CoverageUpdate => "coverage_update",
        }
    }

    /// Parses from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "coordinate_update" => Some(ActionType::CoordinateUpdate),
            "dvr_coordinate_update" => Some(ActionType::DvrCoordinateUpdate),
            "camera_assignment" => Some(ActionType::CameraAssignment),
            "camera_unassignment" => Some(ActionType::CameraUnassignment),
            "coverage_update" => Some(ActionType::CoverageUpdate),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single action log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogEntry {
    pub action: ActionType,
    pub device: DeviceRef,
    pub details: JsonValue,
    pub recorded_at: DateTime<Utc>,
}

fn point_json(point: Option<GeoPoint>) -> JsonValue {
    match point {
        Some(p) => json!({ "latitude": p.latitude, "longitude": p.longitude }),
        None => JsonValue::Null,
    }
}

fn coverage_json(params: CoverageParams) -> JsonValue {
    json!({
        "radius": params.radius,
        "field_of_view": params.field_of_view,
        "direction": params.direction,
    })
}

impl ActionLogEntry {
    /// Entry for a committed position write on a camera or DVR.
    pub fn position_update(
        device: DeviceRef,
        previous: Option<GeoPoint>,
        committed: GeoPoint,
        source: &str,
    ) -> Self {
        let action = match device.kind {
            DeviceKind::Camera => ActionType::CoordinateUpdate,
            DeviceKind::Dvr => ActionType::DvrCoordinateUpdate,
        };
        Self {
            action,
            device,
            details: json!({
                "previous": point_json(previous),
                "committed": point_json(Some(committed)),
                "source": source,
            }),
            recorded_at: Utc::now(),
        }
    }

    /// Entry for a camera joining a DVR.
    pub fn assignment(camera_id: i64, dvr_id: i64, previous_dvr_id: Option<i64>) -> Self {
        Self {
            action: ActionType::CameraAssignment,
            device: DeviceRef::camera(camera_id),
            details: json!({ "dvr_id": dvr_id, "previous_dvr_id": previous_dvr_id }),
            recorded_at: Utc::now(),
        }
    }

    /// Entry for a change of a camera's coverage parameters.
    pub fn coverage_update(
        camera_id: i64,
        previous: CoverageParams,
        committed: CoverageParams,
    ) -> Self {
        Self {
            action: ActionType::CoverageUpdate,
            device: DeviceRef::camera(camera_id),
            details: json!({
                "previous": coverage_json(previous),
                "committed": coverage_json(committed),
            }),
            recorded_at: Utc::now(),
        }
    }

    /// Entry for a camera leaving its DVR.
    pub fn unassignment(camera_id: i64, previous_dvr_id: Option<i64>) -> Self {
        Self {
            action: ActionType::CameraUnassignment,
            device: DeviceRef::camera(camera_id),
            details: json!({ "previous_dvr_id": previous_dvr_id }),
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_update_action_by_kind() {
        let cam = ActionLogEntry::position_update(
            DeviceRef::camera(1),
            None,
            GeoPoint::new(1.0, 2.0),
            "explicit",
        );
        assert_eq!(cam.action, ActionType::CoordinateUpdate);
        assert!(cam.details["previous"].is_null());
        assert_eq!(cam.details["committed"]["longitude"], 2.0);

        let dvr = ActionLogEntry::position_update(
            DeviceRef::dvr(1),
            Some(GeoPoint::new(0.0, 0.0)),
            GeoPoint::new(1.0, 2.0),
            "explicit",
        );
        assert_eq!(dvr.action, ActionType::DvrCoordinateUpdate);
    }

    #[test]
    fn test_assignment_details() {
        let entry = ActionLogEntry::assignment(3, 5, None);
        assert_eq!(entry.device, DeviceRef::camera(3));
        assert_eq!(entry.details["dvr_id"], 5);
        assert!(entry.details["previous_dvr_id"].is_null());
    }

    #[test]
    fn test_coverage_update_details() {
        let entry = ActionLogEntry::coverage_update(
            4,
            CoverageParams::default(),
            CoverageParams::new(120.0, 90.0, 45.0),
        );
        assert_eq!(entry.action, ActionType::CoverageUpdate);
        assert_eq!(entry.device, DeviceRef::camera(4));
        assert_eq!(entry.details["previous"]["radius"], 50.0);
        assert_eq!(entry.details["committed"]["field_of_view"], 90.0);
        assert_eq!(entry.details["committed"]["direction"], 45.0);
    }

    #[test]
    fn test_action_type_strings() {
        for action in [
            ActionType::CoordinateUpdate,
            ActionType::DvrCoordinateUpdate,
            ActionType::CameraAssignment,
            ActionType::CameraUnassignment,
            ActionType::CoverageUpdate,
        ] {
            assert_eq!(ActionType::parse(action.as_str()), Some(action));
        }
        assert_eq!(ActionType::parse("delete"), None);
    }
}
