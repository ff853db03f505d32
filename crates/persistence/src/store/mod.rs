//! `DeviceStore` implementations.

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryDeviceStore, InMemoryTransaction};
pub use postgres::{PgDeviceStore, PgDeviceTransaction};
