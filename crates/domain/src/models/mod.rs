//! Domain models for the camera map.

pub mod action_log;
pub mod assignment;
pub mod camera;
pub mod coverage;
pub mod device;
pub mod drag;
pub mod dvr;
pub mod position;

pub use action_log::{ActionLogEntry, ActionType};
pub use assignment::{
    AssignmentAudit, AssignmentIssue, AssignmentResult, BulkRelocationSummary, CameraFailure,
    DvrMoveResult, DvrRelocation, DvrRelocationOutcome, PropagationSummary, UnassignmentResult,
};
pub use camera::{Camera, CoverageParams, LocationSource};
pub use coverage::{AreaType, CoverageArea, CoverageOverlap, CoverageUpdate};
pub use device::{Device, DeviceKind, DeviceRef, GeoPoint};
pub use drag::{DragPosition, DragRequest};
pub use dvr::Dvr;
pub use position::{PositionChange, PositionIntent, PositionUpdateResult};
