//! Domain error types.

use serde::{Deserialize, Serialize};
use shared::validation::ValidationFailure;
use thiserror::Error;

use crate::models::DeviceRef;

/// Error kinds reported to callers of the spatial engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidType,
    OutOfRange,
    MissingPosition,
    NotFound,
    StorageFailure,
    ValidationFailed,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidType => write!(f, "invalid_type"),
            ErrorKind::OutOfRange => write!(f, "out_of_range"),
            ErrorKind::MissingPosition => write!(f, "missing_position"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::StorageFailure => write!(f, "storage_failure"),
            ErrorKind::ValidationFailed => write!(f, "validation_failed"),
        }
    }
}

/// Failure raised by a device store.
///
/// Every variant is treated as transient by the transaction manager: an
/// attempt that hits one is rolled back and retried.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Row lock contention on {0}")]
    LockContention(DeviceRef),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Errors produced by spatial engine operations.
#[derive(Debug, Clone, Error)]
pub enum SpatialError {
    #[error("Invalid input: {0}")]
    InvalidInput(ValidationFailure),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("{0} has no position")]
    MissingPosition(DeviceRef),

    #[error("{0} not found")]
    NotFound(DeviceRef),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl SpatialError {
    /// Maps the error onto the kind reported to the UI layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpatialError::InvalidInput(ValidationFailure::InvalidType { .. }) => {
                ErrorKind::InvalidType
            }
            SpatialError::InvalidInput(ValidationFailure::OutOfRange { .. }) => {
                ErrorKind::OutOfRange
            }
            SpatialError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            SpatialError::MissingPosition(_) => ErrorKind::MissingPosition,
            SpatialError::NotFound(_) => ErrorKind::NotFound,
            SpatialError::Storage(_) => ErrorKind::StorageFailure,
        }
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SpatialError::Storage(_))
    }
}

impl From<ValidationFailure> for SpatialError {
    fn from(failure: ValidationFailure) -> Self {
        SpatialError::InvalidInput(failure)
    }
}
