//! Coverage geometry for camera placement.
//!
//! Offsets are computed with the equirectangular approximation, which is
//! accurate to well under a meter for the radii cameras use (up to 10 km).
//! Bearings are clockwise from north.

use std::iter::FusedIterator;

use shared::validation::{validate_coordinates, validate_coverage_params};

use crate::errors::SpatialError;
use crate::models::{AreaType, Camera, CoverageArea, Device, GeoPoint};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Number of distinct vertices in a full-circle ring.
pub const CIRCLE_SEGMENTS: usize = 64;

/// Number of vertices along the arc of a sector.
pub const SECTOR_ARC_POINTS: usize = 33;

/// Floor for `cos(latitude)` so longitude offsets stay finite at the poles.
const MIN_COS_LATITUDE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Circle,
    Sector { start_bearing: f64, sweep: f64 },
}

/// Closed coverage polygon around a center point.
///
/// Vertices are generated on demand; the geometry can be iterated any
/// number of times and always yields the same sequence, ending with a copy
/// of its first vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageGeometry {
    center: GeoPoint,
    radius: f64,
    shape: Shape,
}

impl CoverageGeometry {
    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn area_type(&self) -> AreaType {
        match self.shape {
            Shape::Circle => AreaType::Circular,
            Shape::Sector { .. } => AreaType::Directional,
        }
    }

    /// Total vertex count including the closing vertex.
    pub fn len(&self) -> usize {
        match self.shape {
            Shape::Circle => CIRCLE_SEGMENTS + 1,
            Shape::Sector { .. } => SECTOR_ARC_POINTS + 2,
        }
    }

    /// Always false: every geometry has at least one ring.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn vertices(&self) -> Vertices {
        Vertices {
            geometry: *self,
            front: 0,
            back: self.len(),
        }
    }

    pub fn to_vec(&self) -> Vec<GeoPoint> {
        self.vertices().collect()
    }

    /// Converts to a `geo` polygon (x = longitude, y = latitude).
    pub fn to_polygon(&self) -> geo::Polygon<f64> {
        let ring: Vec<geo::Coord<f64>> = self
            .vertices()
            .map(|p| geo::coord! { x: p.longitude, y: p.latitude })
            .collect();
        geo::Polygon::new(geo::LineString::from(ring), vec![])
    }

    fn vertex(&self, index: usize) -> GeoPoint {
        match self.shape {
            Shape::Circle => {
                let step = 360.0 / CIRCLE_SEGMENTS as f64;
                let bearing = (index % CIRCLE_SEGMENTS) as f64 * step;
                offset_point(self.center, self.radius, bearing)
            }
            Shape::Sector {
                start_bearing,
                sweep,
            } => {
                if index == 0 || index == SECTOR_ARC_POINTS + 1 {
                    return self.center;
                }
                let step = sweep / (SECTOR_ARC_POINTS - 1) as f64;
                let bearing = (start_bearing + (index - 1) as f64 * step).rem_euclid(360.0);
                offset_point(self.center, self.radius, bearing)
            }
        }
    }
}

impl<'a> IntoIterator for &'a CoverageGeometry {
    type Item = GeoPoint;
    type IntoIter = Vertices;

    fn into_iter(self) -> Self::IntoIter {
        self.vertices()
    }
}

/// Iterator over the vertices of a [`CoverageGeometry`].
#[derive(Debug, Clone)]
pub struct Vertices {
    geometry: CoverageGeometry,
    front: usize,
    back: usize,
}

impl Iterator for Vertices {
    type Item = GeoPoint;

    fn next(&mut self) -> Option<GeoPoint> {
        if self.front >= self.back {
            return None;
        }
        let point = self.geometry.vertex(self.front);
        self.front += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Vertices {
    fn next_back(&mut self) -> Option<GeoPoint> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.geometry.vertex(self.back))
    }
}

impl ExactSizeIterator for Vertices {}

impl FusedIterator for Vertices {}

fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// Point `distance` meters from `center` along `bearing` degrees.
fn offset_point(center: GeoPoint, distance: f64, bearing: f64) -> GeoPoint {
    let angular = distance / EARTH_RADIUS_M;
    let bearing = bearing.to_radians();
    let cos_lat = center.latitude.to_radians().cos().max(MIN_COS_LATITUDE);

    let d_lat = (angular * bearing.cos()).to_degrees();
    let d_lon = (angular * bearing.sin() / cos_lat).to_degrees();

    GeoPoint::new(
        (center.latitude + d_lat).clamp(-90.0, 90.0),
        wrap_longitude(center.longitude + d_lon),
    )
}

/// Full-circle coverage ring around a position.
pub fn circular_coverage(
    latitude: f64,
    longitude: f64,
    radius: f64,
) -> Result<CoverageGeometry, SpatialError> {
    validate_coordinates(latitude, longitude)?;
    validate_coverage_params(radius, 360.0, 0.0)?;

    Ok(CoverageGeometry {
        center: GeoPoint::new(latitude, longitude),
        radius,
        shape: Shape::Circle,
    })
}

/// Sector coverage centred on `direction` and spanning `angle` degrees.
///
/// An angle of 360 yields the same ring as [`circular_coverage`].
pub fn directional_coverage(
    latitude: f64,
    longitude: f64,
    radius: f64,
    direction: f64,
    angle: f64,
) -> Result<CoverageGeometry, SpatialError> {
    validate_coordinates(latitude, longitude)?;
    validate_coverage_params(radius, angle, direction)?;

    if angle >= 360.0 {
        return circular_coverage(latitude, longitude, radius);
    }

    Ok(CoverageGeometry {
        center: GeoPoint::new(latitude, longitude),
        radius,
        shape: Shape::Sector {
            start_bearing: (direction - angle / 2.0).rem_euclid(360.0),
            sweep: angle,
        },
    })
}

/// Coverage geometry for a stored camera.
pub fn coverage_for_camera(camera: &Camera) -> Result<CoverageGeometry, SpatialError> {
    let position = camera
        .position()
        .ok_or(SpatialError::MissingPosition(camera.device_ref()))?;
    let params = camera.coverage;
    directional_coverage(
        position.latitude,
        position.longitude,
        params.radius,
        params.direction,
        params.field_of_view,
    )
}

/// Coverage area of a stored camera, with display metadata.
pub fn coverage_area(camera: &Camera) -> Result<CoverageArea, SpatialError> {
    let geometry = coverage_for_camera(camera)?;
    Ok(CoverageArea {
        camera_id: camera.id,
        camera_name: camera.display_name(),
        center: geometry.center(),
        radius: camera.coverage.radius,
        field_of_view: camera.coverage.field_of_view,
        direction: camera.coverage.direction,
        area_type: geometry.area_type(),
        coordinates: geometry.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::models::CoverageParams;
    use geo::HaversineDistance;

    fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
        a.to_geo().haversine_distance(&b.to_geo())
    }

    #[test]
    fn test_circular_coverage_is_closed_ring() {
        let geometry = circular_coverage(40.7128, -74.0060, 100.0).unwrap();
        let points = geometry.to_vec();
        assert_eq!(points.len(), CIRCLE_SEGMENTS + 1);
        assert_eq!(points.first(), points.last());
        assert_eq!(geometry.area_type(), AreaType::Circular);
    }

    #[test]
    fn test_circular_coverage_vertices_at_radius() {
        let center = GeoPoint::new(40.7128, -74.0060);
        let geometry = circular_coverage(center.latitude, center.longitude, 100.0).unwrap();
        for point in &geometry {
            let d = distance(center, point);
            assert!((d - 100.0).abs() < 1.0, "vertex at {d} m");
        }
    }

    #[test]
    fn test_first_vertex_points_north() {
        let geometry = circular_coverage(10.0, 20.0, 1000.0).unwrap();
        let first = geometry.vertices().next().unwrap();
        assert!(first.latitude > 10.0);
        assert!((first.longitude - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_geometry_is_restartable_and_exact_size() {
        let geometry = circular_coverage(0.0, 0.0, 50.0).unwrap();
        let mut iter = geometry.vertices();
        assert_eq!(iter.len(), CIRCLE_SEGMENTS + 1);
        iter.next();
        assert_eq!(iter.len(), CIRCLE_SEGMENTS);
        let first: Vec<_> = geometry.vertices().collect();
        let second: Vec<_> = geometry.vertices().collect();
        assert_eq!(first, second);
        assert_eq!(geometry.vertices().rev().count(), geometry.len());
    }

    #[test]
    fn test_directional_full_circle_equals_circular() {
        let circle = circular_coverage(51.5, -0.12, 250.0).unwrap();
        let sector = directional_coverage(51.5, -0.12, 250.0, 90.0, 360.0).unwrap();
        assert_eq!(circle.to_vec(), sector.to_vec());
    }

    #[test]
    fn test_directional_coverage_shape() {
        let center = GeoPoint::new(40.0, -74.0);
        let geometry = directional_coverage(40.0, -74.0, 100.0, 90.0, 60.0).unwrap();
        let points = geometry.to_vec();
        assert_eq!(points.len(), SECTOR_ARC_POINTS + 2);
        assert_eq!(points[0], center);
        assert_eq!(points[points.len() - 1], center);
        assert_eq!(geometry.area_type(), AreaType::Directional);

        // Camera faces east: every arc vertex lies east of the center.
        for point in &points[1..points.len() - 1] {
            assert!(point.longitude > center.longitude);
            assert!((distance(center, *point) - 100.0).abs() < 1.0);
        }
    }

    #[test]
    fn test_directional_coverage_wraps_bearing_through_north() {
        let geometry = directional_coverage(0.0, 0.0, 100.0, 0.0, 90.0).unwrap();
        let points = geometry.to_vec();
        // Arc runs from 315 to 45 degrees, so it starts west and ends east.
        assert!(points[1].longitude < 0.0);
        assert!(points[SECTOR_ARC_POINTS].longitude > 0.0);
        // Middle of the arc points due north.
        let middle = points[1 + SECTOR_ARC_POINTS / 2];
        assert!(middle.latitude > 0.0);
        assert!(middle.longitude.abs() < 1e-9);
    }

    #[test]
    fn test_coverage_near_antimeridian_wraps_longitude() {
        let geometry = circular_coverage(0.0, 179.9999, 1000.0).unwrap();
        for point in &geometry {
            assert!((-180.0..=180.0).contains(&point.longitude));
        }
        assert!(geometry.vertices().any(|p| p.longitude < 0.0));
    }

    #[test]
    fn test_coverage_at_pole_stays_finite() {
        let geometry = circular_coverage(90.0, 0.0, 100.0).unwrap();
        for point in &geometry {
            assert!(point.latitude.is_finite() && point.longitude.is_finite());
            assert!((-90.0..=90.0).contains(&point.latitude));
            assert!((-180.0..=180.0).contains(&point.longitude));
        }
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let err = circular_coverage(91.0, 0.0, 50.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        let err = circular_coverage(0.0, 0.0, 0.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        let err = directional_coverage(0.0, 0.0, 50.0, 360.0, 90.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        let err = directional_coverage(0.0, f64::NAN, 50.0, 0.0, 90.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_coverage_for_unpositioned_camera() {
        let camera = Camera::new(3, "Yard");
        let err = coverage_for_camera(&camera).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingPosition);
    }

    #[test]
    fn test_coverage_area_for_camera() {
        let camera = Camera::new(3, "Yard")
            .with_position(40.0, -74.0)
            .with_coverage(CoverageParams::new(75.0, 120.0, 180.0));
        let area = coverage_area(&camera).unwrap();
        assert_eq!(area.camera_id, 3);
        assert_eq!(area.camera_name, "Yard");
        assert_eq!(area.area_type, AreaType::Directional);
        assert_eq!(area.coordinates.len(), SECTOR_ARC_POINTS + 2);
        assert_eq!(area.center, GeoPoint::new(40.0, -74.0));
    }

    #[test]
    fn test_coverage_is_deterministic() {
        let a = directional_coverage(12.5, 99.1, 300.0, 200.0, 45.0).unwrap();
        let b = directional_coverage(12.5, 99.1, 300.0, 200.0, 45.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_vec(), b.to_vec());
    }
}
