//! Camera to DVR assignment and location inheritance.
//!
//! Cameras assigned to a DVR may take their position from it. Such cameras
//! are tagged `Inherited` and follow the DVR when it moves; cameras placed
//! by an operator are tagged `Explicit` and keep their position unless a
//! propagation is forced.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use domain::models::{
    ActionLogEntry, AssignmentAudit, AssignmentIssue, AssignmentResult, BulkRelocationSummary,
    CameraFailure, Device, DeviceRef, DvrMoveResult, DvrRelocation, DvrRelocationOutcome,
    LocationSource, PositionIntent, PropagationSummary, UnassignmentResult,
};
use domain::services::{DeviceStore, DeviceTransaction};
use domain::SpatialError;

use super::position_update::{stage_position, PositionUpdateManager, ScopedTransaction};

/// Keeps camera positions consistent with the DVRs they are assigned to.
#[derive(Clone)]
pub struct LocationInheritancePropagator {
    store: Arc<dyn DeviceStore>,
    positions: Arc<PositionUpdateManager>,
}

impl LocationInheritancePropagator {
    pub fn new(positions: Arc<PositionUpdateManager>) -> Self {
        Self {
            store: Arc::clone(positions.store()),
            positions,
        }
    }

    /// Assigns a camera to a DVR, optionally copying the DVR position into it.
    ///
    /// The position is copied only when the camera has none yet or already
    /// inherits it, and the DVR itself is positioned.
    pub async fn assign_camera_to_dvr(
        &self,
        camera_id: i64,
        dvr_id: i64,
        inherit_location: bool,
    ) -> Result<AssignmentResult, SpatialError> {
        let camera = DeviceRef::camera(camera_id);
        let result = self
            .positions
            .with_retry(camera, move || async move {
                let mut scope = ScopedTransaction::begin(self.store.as_ref()).await?;
                let outcome =
                    Self::stage_assignment(scope.tx(), camera_id, dvr_id, inherit_location).await;
                scope.finish(outcome).await
            })
            .await;

        match &result {
            Ok(assignment) => info!(
                camera_id = %camera_id,
                dvr_id = %dvr_id,
                position_changed = %assignment.camera_position_changed,
                "Camera assigned to DVR"
            ),
            Err(err) => warn!(
                camera_id = %camera_id,
                dvr_id = %dvr_id,
                error = %err,
                "Camera assignment failed"
            ),
        }
        result
    }

    async fn stage_assignment(
        tx: &mut dyn DeviceTransaction,
        camera_id: i64,
        dvr_id: i64,
        inherit_location: bool,
    ) -> Result<AssignmentResult, SpatialError> {
        let camera_ref = DeviceRef::camera(camera_id);
        // Camera before DVR, the same order every other writer uses.
        let camera = tx
            .lock_camera(camera_id)
            .await?
            .ok_or(SpatialError::NotFound(camera_ref))?;
        let dvr = tx
            .lock_dvr(dvr_id)
            .await?
            .ok_or(SpatialError::NotFound(DeviceRef::dvr(dvr_id)))?;

        tx.set_camera_dvr(camera_id, Some(dvr_id)).await?;
        tx.record_action(&ActionLogEntry::assignment(camera_id, dvr_id, camera.dvr_id))
            .await?;

        let mut camera_position_changed = false;
        if inherit_location && camera.accepts_inherited_position() {
            if let Some(position) = dvr.position() {
                let previous = camera.position();
                stage_position(tx, camera_ref, previous, position, LocationSource::Inherited)
                    .await?;
                camera_position_changed = previous != Some(position);
            }
        }

        Ok(AssignmentResult {
            success: true,
            camera_position_changed,
        })
    }

    /// Pushes a DVR's position to the cameras assigned to it.
    ///
    /// Without `force_update` only inherited and unpositioned cameras are
    /// written; with it every assigned camera is. Each camera is written in
    /// its own transaction. A camera that fails is recorded in the summary
    /// and does not stop the others.
    pub async fn propagate_dvr_location(
        &self,
        dvr_id: i64,
        force_update: bool,
    ) -> Result<PropagationSummary, SpatialError> {
        let dvr_ref = DeviceRef::dvr(dvr_id);
        let dvr = self
            .store
            .find_dvr(dvr_id)
            .await?
            .ok_or(SpatialError::NotFound(dvr_ref))?;
        let position = dvr
            .position()
            .ok_or(SpatialError::MissingPosition(dvr_ref))?;

        let cameras = self.store.find_cameras_by_dvr(dvr_id).await?;
        let mut summary = PropagationSummary::new(dvr_id);
        let intent = PositionIntent::Inherited {
            dvr_id,
            force: force_update,
        };

        for camera in cameras {
            if !force_update && !camera.accepts_inherited_position() {
                debug!(camera_id = %camera.id, dvr_id = %dvr_id, "Explicit camera skipped");
                counter!("propagation_cameras_total", "outcome" => "skipped").increment(1);
                summary.skipped += 1;
                continue;
            }

            match self
                .positions
                .apply_position(camera.device_ref(), position, intent)
                .await
            {
                Ok(change) if change.applied => {
                    counter!("propagation_cameras_total", "outcome" => "succeeded").increment(1);
                    summary.attempted += 1;
                    summary.succeeded += 1;
                }
                Ok(_) => {
                    // Reassigned or made explicit since the camera list was read.
                    counter!("propagation_cameras_total", "outcome" => "skipped").increment(1);
                    summary.skipped += 1;
                }
                Err(err) => {
                    warn!(
                        camera_id = %camera.id,
                        dvr_id = %dvr_id,
                        error = %err,
                        "Failed to propagate DVR location to camera"
                    );
                    counter!("propagation_cameras_total", "outcome" => "failed").increment(1);
                    summary.attempted += 1;
                    summary.failed.push(CameraFailure {
                        camera_id: camera.id,
                        error: err.kind(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            dvr_id = %dvr_id,
            force = %force_update,
            attempted = %summary.attempted,
            succeeded = %summary.succeeded,
            skipped = %summary.skipped,
            failed = %summary.failed.len(),
            "DVR location propagated"
        );
        Ok(summary)
    }

    /// Removes a camera from its DVR. Position and location source are kept.
    pub async fn unassign_camera(
        &self,
        camera_id: i64,
    ) -> Result<UnassignmentResult, SpatialError> {
        let camera_ref = DeviceRef::camera(camera_id);
        let result = self
            .positions
            .with_retry(camera_ref, move || async move {
                let mut scope = ScopedTransaction::begin(self.store.as_ref()).await?;
                let outcome = Self::stage_unassignment(scope.tx(), camera_id).await;
                scope.finish(outcome).await
            })
            .await?;

        info!(
            camera_id = %camera_id,
            previous_dvr_id = ?result.previous_dvr_id,
            "Camera unassigned"
        );
        Ok(result)
    }

    async fn stage_unassignment(
        tx: &mut dyn DeviceTransaction,
        camera_id: i64,
    ) -> Result<UnassignmentResult, SpatialError> {
        let camera = tx
            .lock_camera(camera_id)
            .await?
            .ok_or(SpatialError::NotFound(DeviceRef::camera(camera_id)))?;

        tx.set_camera_dvr(camera_id, None).await?;
        tx.record_action(&ActionLogEntry::unassignment(camera_id, camera.dvr_id))
            .await?;

        Ok(UnassignmentResult {
            camera_id,
            previous_dvr_id: camera.dvr_id,
        })
    }

    /// Moves a DVR and, if requested, carries its inheriting cameras along.
    ///
    /// A propagation failure does not undo the committed DVR move.
    pub async fn move_dvr(
        &self,
        dvr_id: i64,
        latitude: f64,
        longitude: f64,
        propagate: bool,
    ) -> DvrMoveResult {
        let position = self
            .positions
            .update_position(DeviceRef::dvr(dvr_id), latitude, longitude)
            .await;

        if !position.success || !propagate {
            return DvrMoveResult {
                position,
                propagation: None,
                propagation_error: None,
            };
        }

        match self.propagate_dvr_location(dvr_id, false).await {
            Ok(summary) => DvrMoveResult {
                position,
                propagation: Some(summary),
                propagation_error: None,
            },
            Err(err) => {
                warn!(dvr_id = %dvr_id, error = %err, "DVR moved but propagation failed");
                DvrMoveResult {
                    position,
                    propagation: None,
                    propagation_error: Some(err.kind()),
                }
            }
        }
    }

    /// Moves several DVRs one after another.
    ///
    /// Each DVR is validated and committed on its own, so one bad entry does
    /// not stop the rest.
    pub async fn bulk_move_dvrs(
        &self,
        relocations: &[DvrRelocation],
        propagate: bool,
    ) -> BulkRelocationSummary {
        let mut summary = BulkRelocationSummary::default();
        for relocation in relocations {
            let result = self
                .move_dvr(
                    relocation.dvr_id,
                    relocation.latitude,
                    relocation.longitude,
                    propagate,
                )
                .await;
            if result.position.success {
                summary.updated += 1;
            } else {
                summary.failed += 1;
            }
            summary.outcomes.push(DvrRelocationOutcome {
                dvr_id: relocation.dvr_id,
                result,
            });
        }

        info!(
            requested = %relocations.len(),
            updated = %summary.updated,
            failed = %summary.failed,
            "Bulk DVR relocation finished"
        );
        summary
    }

    /// Re-pushes every positioned DVR's location to its inheriting cameras.
    pub async fn reconcile(&self) -> Result<Vec<PropagationSummary>, SpatialError> {
        let dvrs = self.store.list_dvrs().await?;
        let mut summaries = Vec::new();
        for dvr in dvrs.iter().filter(|d| d.is_positioned()) {
            summaries.push(self.propagate_dvr_location(dvr.id, false).await?);
        }
        Ok(summaries)
    }

    /// Checks committed assignments for inconsistencies.
    pub async fn audit_assignments(&self) -> Result<AssignmentAudit, SpatialError> {
        let cameras = self.store.list_cameras().await?;
        let dvrs = self.store.list_dvrs().await?;
        let known_dvrs: BTreeSet<i64> = dvrs.iter().map(|d| d.id).collect();

        let mut audit = AssignmentAudit {
            cameras_checked: cameras.len(),
            dvrs_checked: dvrs.len(),
            issues: Vec::new(),
        };
        let mut cameras_per_dvr: BTreeMap<i64, usize> = BTreeMap::new();

        for camera in &cameras {
            match camera.dvr_id {
                Some(dvr_id) if !known_dvrs.contains(&dvr_id) => {
                    warn!(
                        camera_id = %camera.id,
                        dvr_id = %dvr_id,
                        "Camera references missing DVR"
                    );
                    audit.issues.push(AssignmentIssue::OrphanedCamera {
                        camera_id: camera.id,
                        dvr_id,
                    });
                }
                Some(dvr_id) => *cameras_per_dvr.entry(dvr_id).or_default() += 1,
                None if camera.is_inherited() => {
                    warn!(camera_id = %camera.id, "Inherited camera has no DVR");
                    audit
                        .issues
                        .push(AssignmentIssue::InheritedWithoutDvr { camera_id: camera.id });
                }
                None => {}
            }
        }

        for dvr in dvrs.iter().filter(|d| !d.is_positioned()) {
            if let Some(&camera_count) = cameras_per_dvr.get(&dvr.id) {
                warn!(
                    dvr_id = %dvr.id,
                    camera_count = %camera_count,
                    "DVR with cameras has no location"
                );
                audit.issues.push(AssignmentIssue::DvrWithoutLocation {
                    dvr_id: dvr.id,
                    camera_count,
                });
            }
        }

        info!(
            cameras = %audit.cameras_checked,
            dvrs = %audit.dvrs_checked,
            issues = %audit.issues.len(),
            "Assignment audit complete"
        );
        Ok(audit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{Camera, Dvr, GeoPoint};
    use persistence::InMemoryDeviceStore;
    use std::time::Duration;

    use crate::services::RetryPolicy;

    fn propagator(store: &InMemoryDeviceStore) -> LocationInheritancePropagator {
        let retry = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        let store: Arc<dyn DeviceStore> = Arc::new(store.clone());
        LocationInheritancePropagator::new(Arc::new(PositionUpdateManager::new(store, retry)))
    }

    #[tokio::test]
    async fn test_assign_unknown_dvr_is_not_found() {
        let store = InMemoryDeviceStore::new();
        store.insert_camera(Camera::new(1, "Gate")).await;

        let err = propagator(&store)
            .assign_camera_to_dvr(1, 42, true)
            .await
            .unwrap_err();
        assert!(matches!(err, SpatialError::NotFound(d) if d == DeviceRef::dvr(42)));
        assert_eq!(store.commit_count().await, 0);
    }

    #[tokio::test]
    async fn test_assign_without_inherit_keeps_position() {
        let store = InMemoryDeviceStore::new();
        store.insert_camera(Camera::new(1, "Gate")).await;
        store.insert_dvr(Dvr::new(2, "Rack").with_position(40.0, -74.0)).await;

        let result = propagator(&store)
            .assign_camera_to_dvr(1, 2, false)
            .await
            .unwrap();
        assert!(result.success);
        assert!(!result.camera_position_changed);

        let camera = store.find_camera(1).await.unwrap().unwrap();
        assert_eq!(camera.dvr_id, Some(2));
        assert!(camera.position().is_none());
    }

    #[tokio::test]
    async fn test_camera_assigned_before_dvr_is_placed_follows_first_move() {
        let store = InMemoryDeviceStore::new();
        store.insert_camera(Camera::new(10, "Gate")).await;
        store.insert_dvr(Dvr::new(1, "Rack")).await;
        let propagator = propagator(&store);

        let result = propagator.assign_camera_to_dvr(10, 1, true).await.unwrap();
        assert!(!result.camera_position_changed);

        let moved = propagator.move_dvr(1, 40.0, -74.0, true).await;
        assert!(moved.position.success);
        let summary = moved.propagation.unwrap();
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 0);

        let camera = store.find_camera(10).await.unwrap().unwrap();
        assert_eq!(camera.position(), Some(GeoPoint::new(40.0, -74.0)));
        assert_eq!(camera.location_source, LocationSource::Inherited);
    }

    #[tokio::test]
    async fn test_propagation_skips_camera_reassigned_meanwhile() {
        let store = InMemoryDeviceStore::new();
        store.insert_dvr(Dvr::new(2, "Rack").with_position(40.0, -74.0)).await;
        let mut camera = Camera::new(1, "Gate").with_position(1.0, 1.0);
        camera.dvr_id = Some(3);
        camera.location_source = LocationSource::Inherited;
        store.insert_camera(camera).await;

        let change = propagator(&store)
            .positions
            .apply_position(
                DeviceRef::camera(1),
                GeoPoint::new(40.0, -74.0),
                PositionIntent::Inherited {
                    dvr_id: 2,
                    force: true,
                },
            )
            .await
            .unwrap();
        assert!(!change.applied);
        assert_eq!(
            store.current_position(DeviceRef::camera(1)).await.unwrap(),
            Some(GeoPoint::new(1.0, 1.0))
        );
    }

    #[tokio::test]
    async fn test_reconcile_ignores_unpositioned_dvrs() {
        let store = InMemoryDeviceStore::new();
        store.insert_dvr(Dvr::new(1, "Positioned").with_position(10.0, 10.0)).await;
        store.insert_dvr(Dvr::new(2, "Unplaced")).await;

        let summaries = propagator(&store).reconcile().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].dvr_id, 1);
    }
}
