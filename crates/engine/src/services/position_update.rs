//! Transactional position updates.
//!
//! Every position write runs in its own store transaction: lock the row,
//! read the previous position, write the new one, append an action log
//! entry, commit. Storage failures roll the attempt back and retry it with
//! exponential backoff; validation problems and missing devices are
//! reported immediately. Coverage edits follow the same path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};
use validator::Validate;

use domain::models::{
    ActionLogEntry, CoverageParams, CoverageUpdate, Device, DeviceKind, DeviceRef, DragRequest,
    GeoPoint, LocationSource, PositionChange, PositionIntent, PositionUpdateResult,
};
use domain::services::{DeviceStore, DeviceTransaction};
use domain::{ErrorKind, SpatialError};

/// How storage failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Backoff after the given failed attempt (1-based): 100ms, 200ms, 400ms...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// A store transaction that is committed when the staged work succeeds and
/// rolled back otherwise. Dropping it without finishing also rolls back.
pub(crate) struct ScopedTransaction {
    tx: Box<dyn DeviceTransaction>,
}

impl ScopedTransaction {
    pub(crate) async fn begin(store: &dyn DeviceStore) -> Result<Self, SpatialError> {
        Ok(Self {
            tx: store.begin().await?,
        })
    }

    pub(crate) fn tx(&mut self) -> &mut dyn DeviceTransaction {
        self.tx.as_mut()
    }

    pub(crate) async fn finish<T>(
        self,
        outcome: Result<T, SpatialError>,
    ) -> Result<T, SpatialError> {
        match outcome {
            Ok(value) => {
                self.tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Writes a position and its action log entry inside an open transaction.
///
/// The caller must already hold the row lock for `device`.
pub(crate) async fn stage_position(
    tx: &mut dyn DeviceTransaction,
    device: DeviceRef,
    previous: Option<GeoPoint>,
    position: GeoPoint,
    source: LocationSource,
) -> Result<(), SpatialError> {
    match device.kind {
        DeviceKind::Camera => tx.write_camera_position(device.id, position, source).await?,
        DeviceKind::Dvr => tx.write_dvr_position(device.id, position).await?,
    }
    tx.record_action(&ActionLogEntry::position_update(
        device,
        previous,
        position,
        source.as_str(),
    ))
    .await?;
    Ok(())
}

/// Validates and commits device position changes.
pub struct PositionUpdateManager {
    store: Arc<dyn DeviceStore>,
    retry: RetryPolicy,
}

impl PositionUpdateManager {
    pub fn new(store: Arc<dyn DeviceStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub fn store(&self) -> &Arc<dyn DeviceStore> {
        &self.store
    }

    /// Moves a device to a new position on behalf of an operator.
    ///
    /// Never returns an error: failures are reported in the result together
    /// with the position the caller should revert to.
    pub async fn update_position(
        &self,
        device: DeviceRef,
        latitude: f64,
        longitude: f64,
    ) -> PositionUpdateResult {
        let position = match GeoPoint::validated(latitude, longitude) {
            Ok(position) => position,
            Err(failure) => {
                warn!(device = %device, error = %failure, "Rejected position update");
                counter!("position_updates_total", "outcome" => "rejected").increment(1);
                let previous = self.previous_position(device).await;
                return PositionUpdateResult::failed(
                    ErrorKind::ValidationFailed,
                    failure.to_string(),
                    previous,
                );
            }
        };

        // Position the UI reverts to if every attempt fails.
        let before = self.previous_position(device).await;
        match self
            .apply_position(device, position, PositionIntent::Operator)
            .await
        {
            Ok(change) => {
                info!(
                    device = %device,
                    latitude = %latitude,
                    longitude = %longitude,
                    "Position updated"
                );
                counter!("position_updates_total", "outcome" => "committed").increment(1);
                PositionUpdateResult::committed(change.previous, position)
            }
            Err(err) => {
                warn!(device = %device, error = %err, "Position update failed");
                counter!("position_updates_total", "outcome" => "failed").increment(1);
                let previous = match err {
                    SpatialError::NotFound(_) => None,
                    _ => before,
                };
                PositionUpdateResult::from_error(&err, previous)
            }
        }
    }

    /// Replaces the coverage parameters of a camera.
    ///
    /// Invalid parameters are rejected before any transaction is opened.
    pub async fn update_coverage(
        &self,
        camera_id: i64,
        params: CoverageParams,
    ) -> Result<CoverageUpdate, SpatialError> {
        let device = DeviceRef::camera(camera_id);
        if let Err(errors) = params.validate() {
            warn!(device = %device, error = %errors, "Rejected coverage update");
            counter!("coverage_updates_total", "outcome" => "rejected").increment(1);
            return Err(SpatialError::ValidationFailed(errors.to_string()));
        }

        let result = self
            .with_retry(device, move || async move {
                let mut scope = ScopedTransaction::begin(self.store.as_ref()).await?;
                let outcome = Self::stage_coverage(scope.tx(), camera_id, params).await;
                scope.finish(outcome).await
            })
            .await;

        match &result {
            Ok(update) => {
                info!(
                    device = %device,
                    radius = %params.radius,
                    field_of_view = %params.field_of_view,
                    direction = %params.direction,
                    area_type = %update.area_type,
                    "Coverage updated"
                );
                counter!("coverage_updates_total", "outcome" => "committed").increment(1);
            }
            Err(err) => {
                warn!(device = %device, error = %err, "Coverage update failed");
                counter!("coverage_updates_total", "outcome" => "failed").increment(1);
            }
        }
        result
    }

    /// Handles a marker drop from the map UI.
    pub async fn process_drag_request(&self, payload: serde_json::Value) -> PositionUpdateResult {
        let request: DragRequest = match serde_json::from_value(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Malformed drag request");
                return PositionUpdateResult::failed(
                    ErrorKind::ValidationFailed,
                    format!("Invalid drag request: {}", e),
                    None,
                );
            }
        };

        let device = request.device();
        let position = request.position();
        if let Err(errors) = position.validate() {
            warn!(device = %device, error = %errors, "Drag request failed validation");
            let previous = self.previous_position(device).await;
            return PositionUpdateResult::failed(
                ErrorKind::ValidationFailed,
                errors.to_string(),
                previous,
            );
        }

        self.update_position(device, position.latitude, position.longitude)
            .await
    }

    /// Shared write path for operator and inherited position changes.
    ///
    /// Inherited writes re-check under the row lock that the camera still
    /// belongs to the DVR and, unless forced, still inherits its position or
    /// has none. Otherwise the camera is left untouched and the change is
    /// reported as not applied.
    pub async fn apply_position(
        &self,
        device: DeviceRef,
        position: GeoPoint,
        intent: PositionIntent,
    ) -> Result<PositionChange, SpatialError> {
        self.with_retry(device, move || self.attempt(device, position, intent))
            .await
    }

    /// Runs `operation` until it succeeds, fails with a non-storage error, or
    /// the retry budget is spent.
    pub(crate) async fn with_retry<T, F, Fut>(
        &self,
        device: DeviceRef,
        mut operation: F,
    ) -> Result<T, SpatialError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SpatialError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        device = %device,
                        attempt = %attempt,
                        delay_ms = %delay.as_millis(),
                        error = %err,
                        "Storage failure, retrying"
                    );
                    counter!("position_update_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(
        &self,
        device: DeviceRef,
        position: GeoPoint,
        intent: PositionIntent,
    ) -> Result<PositionChange, SpatialError> {
        let mut scope = ScopedTransaction::begin(self.store.as_ref()).await?;
        let outcome = Self::stage(scope.tx(), device, position, intent).await;
        scope.finish(outcome).await
    }

    async fn stage(
        tx: &mut dyn DeviceTransaction,
        device: DeviceRef,
        position: GeoPoint,
        intent: PositionIntent,
    ) -> Result<PositionChange, SpatialError> {
        match device.kind {
            DeviceKind::Camera => {
                let camera = tx
                    .lock_camera(device.id)
                    .await?
                    .ok_or(SpatialError::NotFound(device))?;
                let previous = camera.position();

                let source = match intent {
                    PositionIntent::Operator if previous == Some(position) => {
                        camera.location_source
                    }
                    PositionIntent::Operator => LocationSource::Explicit,
                    PositionIntent::Inherited { dvr_id, force } => {
                        if camera.dvr_id != Some(dvr_id)
                            || (!force && !camera.accepts_inherited_position())
                        {
                            debug!(
                                camera_id = %device.id,
                                dvr_id = %dvr_id,
                                "Camera no longer inherits from DVR, skipping"
                            );
                            return Ok(PositionChange::skipped(previous));
                        }
                        LocationSource::Inherited
                    }
                };

                stage_position(tx, device, previous, position, source).await?;
                Ok(PositionChange::applied(previous, position))
            }
            DeviceKind::Dvr => {
                let dvr = tx
                    .lock_dvr(device.id)
                    .await?
                    .ok_or(SpatialError::NotFound(device))?;
                let previous = dvr.position();
                stage_position(tx, device, previous, position, LocationSource::Explicit).await?;
                Ok(PositionChange::applied(previous, position))
            }
        }
    }

    async fn stage_coverage(
        tx: &mut dyn DeviceTransaction,
        camera_id: i64,
        params: CoverageParams,
    ) -> Result<CoverageUpdate, SpatialError> {
        let camera = tx
            .lock_camera(camera_id)
            .await?
            .ok_or(SpatialError::NotFound(DeviceRef::camera(camera_id)))?;
        tx.write_camera_coverage(camera_id, params).await?;
        tx.record_action(&ActionLogEntry::coverage_update(
            camera_id,
            camera.coverage,
            params,
        ))
        .await?;
        Ok(CoverageUpdate {
            camera_id,
            previous: camera.coverage,
            committed: params,
            area_type: params.area_type(),
        })
    }

    async fn previous_position(&self, device: DeviceRef) -> Option<GeoPoint> {
        match self.store.current_position(device).await {
            Ok(position) => position,
            Err(err) => {
                debug!(device = %device, error = %err, "Could not read previous position");
                None
            }
        }
    }
}
