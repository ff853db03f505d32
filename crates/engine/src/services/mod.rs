//! Engine services.

pub mod inheritance;
pub mod position_update;

pub use inheritance::LocationInheritancePropagator;
pub use position_update::{PositionUpdateManager, RetryPolicy};
