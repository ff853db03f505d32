//! Position update models.

use serde::{Deserialize, Serialize};

use super::device::GeoPoint;
use crate::errors::{ErrorKind, SpatialError};

/// Who is asking for a position write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionIntent {
    /// An operator moved the device on the map.
    Operator,
    /// The position is copied from the camera's DVR.
    Inherited { dvr_id: i64, force: bool },
}

/// Outcome of one position write transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionChange {
    pub previous: Option<GeoPoint>,
    /// Position held by the row once the transaction ended.
    pub committed: Option<GeoPoint>,
    /// False when an inherited write was skipped after re-checking the row.
    pub applied: bool,
}

impl PositionChange {
    pub fn applied(previous: Option<GeoPoint>, committed: GeoPoint) -> Self {
        Self {
            previous,
            committed: Some(committed),
            applied: true,
        }
    }

    pub fn skipped(current: Option<GeoPoint>) -> Self {
        Self {
            previous: current,
            committed: current,
            applied: false,
        }
    }
}

/// Result returned to the UI layer for a position update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdateResult {
    pub success: bool,
    pub committed_latitude: Option<f64>,
    pub committed_longitude: Option<f64>,
    pub previous_latitude: Option<f64>,
    pub previous_longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PositionUpdateResult {
    /// A committed update.
    pub fn committed(previous: Option<GeoPoint>, committed: GeoPoint) -> Self {
        Self {
            success: true,
            committed_latitude: Some(committed.latitude),
            committed_longitude: Some(committed.longitude),
            previous_latitude: previous.map(|p| p.latitude),
            previous_longitude: previous.map(|p| p.longitude),
            error: None,
            message: None,
        }
    }

    /// A rejected or failed update; `previous` is what the UI should revert to.
    pub fn failed(kind: ErrorKind, message: impl Into<String>, previous: Option<GeoPoint>) -> Self {
        Self {
            success: false,
            committed_latitude: None,
            committed_longitude: None,
            previous_latitude: previous.map(|p| p.latitude),
            previous_longitude: previous.map(|p| p.longitude),
            error: Some(kind),
            message: Some(message.into()),
        }
    }

    /// A failed update built from an engine error.
    pub fn from_error(error: &SpatialError, previous: Option<GeoPoint>) -> Self {
        Self::failed(error.kind(), error.to_string(), previous)
    }

    pub fn previous(&self) -> Option<GeoPoint> {
        GeoPoint::from_columns(self.previous_latitude, self.previous_longitude)
    }

    pub fn committed_point(&self) -> Option<GeoPoint> {
        GeoPoint::from_columns(self.committed_latitude, self.committed_longitude)
    }
}
