//! Spatial consistency engine for the camera map.
//!
//! Validates device coordinates, computes camera coverage geometry, commits
//! position changes transactionally and keeps cameras in step with the DVRs
//! they inherit their location from.

pub mod config;
pub mod engine;
pub mod logging;
pub mod services;

pub use engine::SpatialEngine;
