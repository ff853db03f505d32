//! Domain services for the camera map.
//!
//! Coverage geometry is pure computation over domain models; the store
//! module defines the persistence port the engine is written against.

pub mod coverage;
pub mod overlap;
pub mod store;

pub use coverage::{
    circular_coverage, coverage_area, coverage_for_camera, directional_coverage,
    CoverageGeometry, Vertices, CIRCLE_SEGMENTS, EARTH_RADIUS_M, SECTOR_ARC_POINTS,
};
pub use overlap::{coverage_area_size, find_coverage_overlaps};
pub use store::{DeviceStore, DeviceTransaction};
