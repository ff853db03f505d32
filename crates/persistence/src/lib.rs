//! Persistence layer for the camera map backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - `DeviceStore` implementations (Postgres and in-memory)

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use error::store_error;
pub use store::{InMemoryDeviceStore, PgDeviceStore};
