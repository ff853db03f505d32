//! Coverage overlap detection and area measurement.

use geo::{ChamberlainDuquetteArea, HaversineDistance};

use shared::validation::validate_coverage_params;

use super::coverage::CoverageGeometry;
use crate::models::{Camera, CoverageOverlap, Device};

/// Finds every pair of positioned cameras whose coverage circles intersect.
///
/// Circles are compared by radius only; field of view is ignored.
/// Unpositioned cameras and cameras with invalid coverage are skipped.
pub fn find_coverage_overlaps(cameras: &[Camera]) -> Vec<CoverageOverlap> {
    let positioned: Vec<(&Camera, geo::Point<f64>)> = cameras
        .iter()
        .filter(|c| {
            let coverage = &c.coverage;
            validate_coverage_params(coverage.radius, coverage.field_of_view, coverage.direction)
                .is_ok()
        })
        .filter_map(|c| c.position().map(|p| (c, p.to_geo())))
        .collect();

    let mut overlaps = Vec::new();
    for (i, (first, first_point)) in positioned.iter().enumerate() {
        for (second, second_point) in &positioned[i + 1..] {
            let distance = first_point.haversine_distance(second_point);
            let reach = first.coverage.radius + second.coverage.radius;
            if distance >= reach {
                continue;
            }

            let overlap_distance = reach - distance;
            let max_overlap = 2.0 * first.coverage.radius.min(second.coverage.radius);
            overlaps.push(CoverageOverlap {
                camera1_id: first.id,
                camera2_id: second.id,
                camera1_name: first.display_name(),
                camera2_name: second.display_name(),
                distance,
                overlap_distance,
                overlap_percentage: (overlap_distance / max_overlap * 100.0).min(100.0),
            });
        }
    }
    overlaps
}

/// Geodesic area enclosed by a coverage polygon, in square meters.
pub fn coverage_area_size(geometry: &CoverageGeometry) -> f64 {
    geometry.to_polygon().chamberlain_duquette_unsigned_area()
}
