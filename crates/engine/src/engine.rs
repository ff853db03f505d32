//! Engine facade used by the map UI layer.

use std::sync::Arc;

use domain::models::{
    AssignmentAudit, AssignmentResult, BulkRelocationSummary, CoverageArea, CoverageOverlap,
    CoverageParams, CoverageUpdate, DeviceRef, DvrMoveResult, DvrRelocation,
    PositionUpdateResult, PropagationSummary, UnassignmentResult,
};
use domain::services::{self as geometry, CoverageGeometry, DeviceStore};
use domain::SpatialError;

use crate::services::{LocationInheritancePropagator, PositionUpdateManager, RetryPolicy};

/// Entry point bundling validation, geometry, position updates and
/// location inheritance over one device store.
#[derive(Clone)]
pub struct SpatialEngine {
    store: Arc<dyn DeviceStore>,
    positions: Arc<PositionUpdateManager>,
    inheritance: LocationInheritancePropagator,
}

impl SpatialEngine {
    pub fn new(store: Arc<dyn DeviceStore>, retry: RetryPolicy) -> Self {
        let positions = Arc::new(PositionUpdateManager::new(Arc::clone(&store), retry));
        let inheritance = LocationInheritancePropagator::new(Arc::clone(&positions));
        Self {
            store,
            positions,
            inheritance,
        }
    }

    pub fn positions(&self) -> &PositionUpdateManager {
        &self.positions
    }

    pub fn inheritance(&self) -> &LocationInheritancePropagator {
        &self.inheritance
    }

    pub async fn update_position(
        &self,
        device: DeviceRef,
        latitude: f64,
        longitude: f64,
    ) -> PositionUpdateResult {
        self.positions
            .update_position(device, latitude, longitude)
            .await
    }

    pub async fn process_drag_request(&self, payload: serde_json::Value) -> PositionUpdateResult {
        self.positions.process_drag_request(payload).await
    }

    pub fn circular_coverage(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
    ) -> Result<CoverageGeometry, SpatialError> {
        geometry::circular_coverage(latitude, longitude, radius)
    }

    pub fn directional_coverage(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
        direction: f64,
        angle: f64,
    ) -> Result<CoverageGeometry, SpatialError> {
        geometry::directional_coverage(latitude, longitude, radius, direction, angle)
    }

    /// Coverage of a stored camera, computed from a committed snapshot.
    pub async fn camera_coverage(&self, camera_id: i64) -> Result<CoverageArea, SpatialError> {
        let camera = self
            .store
            .find_camera(camera_id)
            .await?
            .ok_or(SpatialError::NotFound(DeviceRef::camera(camera_id)))?;
        geometry::coverage_area(&camera)
    }

    pub async fn update_coverage(
        &self,
        camera_id: i64,
        params: CoverageParams,
    ) -> Result<CoverageUpdate, SpatialError> {
        self.positions.update_coverage(camera_id, params).await
    }

    /// Pairs of positioned cameras whose coverage circles intersect.
    pub async fn coverage_overlaps(&self) -> Result<Vec<CoverageOverlap>, SpatialError> {
        let cameras = self.store.list_cameras().await?;
        Ok(geometry::find_coverage_overlaps(&cameras))
    }

    pub async fn assign_camera_to_dvr(
        &self,
        camera_id: i64,
        dvr_id: i64,
        inherit_location: bool,
    ) -> Result<AssignmentResult, SpatialError> {
        self.inheritance
            .assign_camera_to_dvr(camera_id, dvr_id, inherit_location)
            .await
    }

    pub async fn propagate_dvr_location(
        &self,
        dvr_id: i64,
        force_update: bool,
    ) -> Result<PropagationSummary, SpatialError> {
        self.inheritance
            .propagate_dvr_location(dvr_id, force_update)
            .await
    }

    pub async fn unassign_camera(
        &self,
        camera_id: i64,
    ) -> Result<UnassignmentResult, SpatialError> {
        self.inheritance.unassign_camera(camera_id).await
    }

    pub async fn move_dvr(
        &self,
        dvr_id: i64,
        latitude: f64,
        longitude: f64,
        propagate: bool,
    ) -> DvrMoveResult {
        self.inheritance
            .move_dvr(dvr_id, latitude, longitude, propagate)
            .await
    }

    pub async fn bulk_move_dvrs(
        &self,
        relocations: &[DvrRelocation],
        propagate: bool,
    ) -> BulkRelocationSummary {
        self.inheritance.bulk_move_dvrs(relocations, propagate).await
    }

    pub async fn audit_assignments(&self) -> Result<AssignmentAudit, SpatialError> {
        self.inheritance.audit_assignments().await
    }

    pub async fn reconcile(&self) -> Result<Vec<PropagationSummary>, SpatialError> {
        self.inheritance.reconcile().await
    }
}
