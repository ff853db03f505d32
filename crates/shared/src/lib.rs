//! Shared utilities for the camera map backend.
//!
//! This crate provides functionality used across all other crates:
//! - Coordinate and coverage parameter validation
//! - Validation failure types shared by the domain and engine layers

pub mod validation;
