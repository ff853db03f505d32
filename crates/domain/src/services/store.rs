//! Storage port used by the spatial engine.
//!
//! A store hands out scoped transactions over camera and DVR records. Row
//! locks taken inside a transaction are held until it commits or rolls
//! back, which serializes concurrent writers of the same device.

use crate::errors::StoreError;
use crate::models::{
    ActionLogEntry, Camera, CoverageParams, Device, DeviceKind, DeviceRef, Dvr, GeoPoint,
    LocationSource,
};

/// Read access and transaction factory for device records.
#[async_trait::async_trait]
pub trait DeviceStore: Send + Sync {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn DeviceTransaction>, StoreError>;

    /// Read a committed camera snapshot.
    async fn find_camera(&self, id: i64) -> Result<Option<Camera>, StoreError>;

    /// Read a committed DVR snapshot.
    async fn find_dvr(&self, id: i64) -> Result<Option<Dvr>, StoreError>;

    /// Cameras currently assigned to a DVR, ordered by id.
    async fn find_cameras_by_dvr(&self, dvr_id: i64) -> Result<Vec<Camera>, StoreError>;

    /// All cameras, ordered by id.
    async fn list_cameras(&self) -> Result<Vec<Camera>, StoreError>;

    /// All DVRs, ordered by id.
    async fn list_dvrs(&self) -> Result<Vec<Dvr>, StoreError>;

    /// Committed position of any device; `Ok(None)` if it is missing or unpositioned.
    async fn current_position(&self, device: DeviceRef) -> Result<Option<GeoPoint>, StoreError> {
        let position = match device.kind {
            DeviceKind::Camera => self.find_camera(device.id).await?.and_then(|c| c.position()),
            DeviceKind::Dvr => self.find_dvr(device.id).await?.and_then(|d| d.position()),
        };
        Ok(position)
    }
}

/// A single unit of work against the store.
///
/// Dropping a transaction without committing discards its writes.
#[async_trait::async_trait]
pub trait DeviceTransaction: Send {
    /// Lock a camera row for the rest of the transaction and read it.
    async fn lock_camera(&mut self, id: i64) -> Result<Option<Camera>, StoreError>;

    /// Lock a DVR row for the rest of the transaction and read it.
    async fn lock_dvr(&mut self, id: i64) -> Result<Option<Dvr>, StoreError>;

    async fn write_camera_position(
        &mut self,
        id: i64,
        position: GeoPoint,
        source: LocationSource,
    ) -> Result<(), StoreError>;

    async fn write_dvr_position(&mut self, id: i64, position: GeoPoint) -> Result<(), StoreError>;

    async fn write_camera_coverage(
        &mut self,
        id: i64,
        coverage: CoverageParams,
    ) -> Result<(), StoreError>;

    async fn set_camera_dvr(
        &mut self,
        camera_id: i64,
        dvr_id: Option<i64>,
    ) -> Result<(), StoreError>;

    /// Append an action log entry as part of this transaction.
    async fn record_action(&mut self, entry: &ActionLogEntry) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
