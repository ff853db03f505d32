//! Database entity definitions.
//!
//! Entities map directly to database rows and are converted to domain models.

pub mod action_log;
pub mod camera;
pub mod dvr;

pub use action_log::ActionLogEntity;
pub use camera::CameraEntity;
pub use dvr::DvrEntity;
