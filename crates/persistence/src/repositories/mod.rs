//! Repository implementations for database operations.

pub mod action_log;
pub mod camera;
pub mod dvr;

pub use action_log::ActionLogRepository;
pub use camera::CameraRepository;
pub use dvr::DvrRepository;
