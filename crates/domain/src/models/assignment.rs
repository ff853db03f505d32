//! Camera to DVR assignment models.

use serde::{Deserialize, Serialize};

use super::position::PositionUpdateResult;
use crate::errors::ErrorKind;

/// Result of assigning a camera to a DVR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResult {
    pub success: bool,
    pub camera_position_changed: bool,
}

/// Result of removing a camera from its DVR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignmentResult {
    pub camera_id: i64,
    pub previous_dvr_id: Option<i64>,
}

/// Why a single camera could not be updated during propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraFailure {
    pub camera_id: i64,
    pub error: ErrorKind,
    pub message: String,
}

/// Aggregate outcome of pushing a DVR position to its cameras.
///
/// Every camera of the DVR is counted once: `attempted + skipped` is the
/// number of cameras, and `attempted` is `succeeded` plus failures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationSummary {
    pub dvr_id: i64,
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: Vec<CameraFailure>,
}

impl PropagationSummary {
    pub fn new(dvr_id: i64) -> Self {
        Self {
            dvr_id,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of moving a DVR, with the propagation it triggered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DvrMoveResult {
    pub position: PositionUpdateResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation: Option<PropagationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation_error: Option<ErrorKind>,
}

/// Requested new position for one DVR in a bulk relocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DvrRelocation {
    pub dvr_id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DvrRelocationOutcome {
    pub dvr_id: i64,
    pub result: DvrMoveResult,
}

/// Outcome of relocating several DVRs, in request order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRelocationSummary {
    pub updated: usize,
    pub failed: usize,
    pub outcomes: Vec<DvrRelocationOutcome>,
}

impl BulkRelocationSummary {
    /// DVRs whose move was rejected or failed.
    pub fn failed_dvrs(&self) -> impl Iterator<Item = &DvrRelocationOutcome> {
        self.outcomes.iter().filter(|o| !o.result.position.success)
    }
}

/// A consistency problem found by an assignment audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssignmentIssue {
    /// Camera references a DVR that does not exist.
    OrphanedCamera { camera_id: i64, dvr_id: i64 },
    /// DVR owns cameras but has no position to share.
    DvrWithoutLocation { dvr_id: i64, camera_count: usize },
    /// Camera is tagged inherited but belongs to no DVR.
    InheritedWithoutDvr { camera_id: i64 },
}

/// Report produced by an assignment audit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentAudit {
    pub cameras_checked: usize,
    pub dvrs_checked: usize,
    pub issues: Vec<AssignmentIssue>,
}

impl AssignmentAudit {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}
