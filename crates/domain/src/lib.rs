//! Domain layer for the camera map backend.
//!
//! This crate contains:
//! - Domain models (Camera, Dvr, positions, coverage areas, operation results)
//! - The coverage geometry engine
//! - The storage port used by the engine (`DeviceStore`)
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;

pub use errors::{ErrorKind, SpatialError, StoreError};
