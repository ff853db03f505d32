//! In-process device store.
//!
//! Mirrors the transactional behaviour of [`super::PgDeviceStore`]: each
//! device has its own async row lock held until the transaction ends, and
//! writes are staged and only become visible on commit. Faults can be
//! injected to exercise retry and isolation paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use domain::models::{
    ActionLogEntry, Camera, CoverageParams, DeviceRef, Dvr, GeoPoint, LocationSource,
};
use domain::services::{DeviceStore, DeviceTransaction};
use domain::StoreError;

#[derive(Debug, Default)]
struct State {
    cameras: BTreeMap<i64, Camera>,
    dvrs: BTreeMap<i64, Dvr>,
    action_log: Vec<ActionLogEntry>,
    commits: usize,
}

#[derive(Debug, Default)]
struct Faults {
    failing_commits: usize,
    blocked: HashSet<DeviceRef>,
}

#[derive(Debug, Default)]
struct Inner {
    state: RwLock<State>,
    // Entries are cloned only under this lock and pruned once no
    // transaction holds or waits on them.
    row_locks: StdMutex<HashMap<DeviceRef, Arc<Mutex<()>>>>,
    faults: Mutex<Faults>,
}

/// Device store kept in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeviceStore {
    inner: Arc<Inner>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a camera record.
    pub async fn insert_camera(&self, camera: Camera) {
        self.inner.state.write().await.cameras.insert(camera.id, camera);
    }

    /// Insert or replace a DVR record.
    pub async fn insert_dvr(&self, dvr: Dvr) {
        self.inner.state.write().await.dvrs.insert(dvr.id, dvr);
    }

    /// Remove a DVR record, leaving any cameras that reference it.
    pub async fn remove_dvr(&self, id: i64) -> Option<Dvr> {
        self.inner.state.write().await.dvrs.remove(&id)
    }

    /// Snapshot of the committed action log, oldest first.
    pub async fn action_log(&self) -> Vec<ActionLogEntry> {
        self.inner.state.read().await.action_log.clone()
    }

    /// Number of successfully committed transactions.
    pub async fn commit_count(&self) -> usize {
        self.inner.state.read().await.commits
    }

    /// Make the next `count` commits fail with [`StoreError::Unavailable`].
    pub async fn fail_next_commits(&self, count: usize) {
        self.inner.faults.lock().await.failing_commits = count;
    }

    /// Make every lock attempt on `device` fail until [`Self::unblock_device`].
    pub async fn block_device(&self, device: DeviceRef) {
        self.inner.faults.lock().await.blocked.insert(device);
    }

    pub async fn unblock_device(&self, device: DeviceRef) {
        self.inner.faults.lock().await.blocked.remove(&device);
    }
}

#[async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn begin(&self) -> Result<Box<dyn DeviceTransaction>, StoreError> {
        Ok(Box::new(InMemoryTransaction {
            inner: Arc::clone(&self.inner),
            guards: HashMap::new(),
            writes: Vec::new(),
        }))
    }

    async fn find_camera(&self, id: i64) -> Result<Option<Camera>, StoreError> {
        Ok(self.inner.state.read().await.cameras.get(&id).cloned())
    }

    async fn find_dvr(&self, id: i64) -> Result<Option<Dvr>, StoreError> {
        Ok(self.inner.state.read().await.dvrs.get(&id).cloned())
    }

    async fn find_cameras_by_dvr(&self, dvr_id: i64) -> Result<Vec<Camera>, StoreError> {
        let state = self.inner.state.read().await;
        Ok(state
            .cameras
            .values()
            .filter(|c| c.dvr_id == Some(dvr_id))
            .cloned()
            .collect())
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>, StoreError> {
        Ok(self.inner.state.read().await.cameras.values().cloned().collect())
    }

    async fn list_dvrs(&self) -> Result<Vec<Dvr>, StoreError> {
        Ok(self.inner.state.read().await.dvrs.values().cloned().collect())
    }
}

#[derive(Debug, Clone)]
enum StagedWrite {
    CameraPosition {
        id: i64,
        position: GeoPoint,
        source: LocationSource,
    },
    DvrPosition {
        id: i64,
        position: GeoPoint,
    },
    CameraCoverage {
        id: i64,
        coverage: CoverageParams,
    },
    CameraDvr {
        camera_id: i64,
        dvr_id: Option<i64>,
    },
    Action(ActionLogEntry),
}

impl StagedWrite {
    fn apply_to_camera(&self, camera: &mut Camera) {
        match self {
            StagedWrite::CameraPosition {
                id,
                position,
                source,
            } if *id == camera.id => {
                camera.latitude = Some(position.latitude);
                camera.longitude = Some(position.longitude);
                camera.location_source = *source;
            }
            StagedWrite::CameraCoverage { id, coverage } if *id == camera.id => {
                camera.coverage = *coverage;
            }
            StagedWrite::CameraDvr { camera_id, dvr_id } if *camera_id == camera.id => {
                camera.dvr_id = *dvr_id;
            }
            _ => {}
        }
    }

    fn apply_to_dvr(&self, dvr: &mut Dvr) {
        if let StagedWrite::DvrPosition { id, position } = self {
            if *id == dvr.id {
                dvr.latitude = Some(position.latitude);
                dvr.longitude = Some(position.longitude);
            }
        }
    }

    fn apply(self, state: &mut State) {
        match &self {
            StagedWrite::CameraPosition { id, .. }
            | StagedWrite::CameraCoverage { id, .. }
            | StagedWrite::CameraDvr { camera_id: id, .. } => {
                if let Some(camera) = state.cameras.get_mut(id) {
                    self.apply_to_camera(camera);
                }
            }
            StagedWrite::DvrPosition { id, .. } => {
                if let Some(dvr) = state.dvrs.get_mut(id) {
                    self.apply_to_dvr(dvr);
                }
            }
            StagedWrite::Action(_) => {}
        }
        if let StagedWrite::Action(entry) = self {
            state.action_log.push(entry);
        }
    }
}

/// An open in-memory transaction.
///
/// Row guards are released when the transaction is committed, rolled back
/// or dropped.
pub struct InMemoryTransaction {
    inner: Arc<Inner>,
    guards: HashMap<DeviceRef, OwnedMutexGuard<()>>,
    writes: Vec<StagedWrite>,
}

impl InMemoryTransaction {
    async fn acquire(&mut self, device: DeviceRef) -> Result<(), StoreError> {
        if self.inner.faults.lock().await.blocked.contains(&device) {
            return Err(StoreError::LockContention(device));
        }
        if self.guards.contains_key(&device) {
            return Ok(());
        }
        let row_lock = {
            let mut locks = self
                .inner
                .row_locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(device).or_default())
        };
        let guard = row_lock.lock_owned().await;
        self.guards.insert(device, guard);
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if self.guards.is_empty() {
            return;
        }
        let devices: Vec<DeviceRef> = self.guards.keys().copied().collect();
        self.guards.clear();

        let mut locks = self
            .inner
            .row_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for device in devices {
            if locks
                .get(&device)
                .is_some_and(|row_lock| Arc::strong_count(row_lock) == 1)
            {
                locks.remove(&device);
            }
        }
    }
}

#[async_trait]
impl DeviceTransaction for InMemoryTransaction {
    async fn lock_camera(&mut self, id: i64) -> Result<Option<Camera>, StoreError> {
        self.acquire(DeviceRef::camera(id)).await?;
        let camera = self.inner.state.read().await.cameras.get(&id).cloned();
        Ok(camera.map(|mut camera| {
            for write in &self.writes {
                write.apply_to_camera(&mut camera);
            }
            camera
        }))
    }

    async fn lock_dvr(&mut self, id: i64) -> Result<Option<Dvr>, StoreError> {
        self.acquire(DeviceRef::dvr(id)).await?;
        let dvr = self.inner.state.read().await.dvrs.get(&id).cloned();
        Ok(dvr.map(|mut dvr| {
            for write in &self.writes {
                write.apply_to_dvr(&mut dvr);
            }
            dvr
        }))
    }

    async fn write_camera_position(
        &mut self,
        id: i64,
        position: GeoPoint,
        source: LocationSource,
    ) -> Result<(), StoreError> {
        self.writes.push(StagedWrite::CameraPosition {
            id,
            position,
            source,
        });
        Ok(())
    }

    async fn write_dvr_position(&mut self, id: i64, position: GeoPoint) -> Result<(), StoreError> {
        self.writes.push(StagedWrite::DvrPosition { id, position });
        Ok(())
    }

    async fn write_camera_coverage(
        &mut self,
        id: i64,
        coverage: CoverageParams,
    ) -> Result<(), StoreError> {
        self.writes.push(StagedWrite::CameraCoverage { id, coverage });
        Ok(())
    }

    async fn set_camera_dvr(
        &mut self,
        camera_id: i64,
        dvr_id: Option<i64>,
    ) -> Result<(), StoreError> {
        self.writes.push(StagedWrite::CameraDvr { camera_id, dvr_id });
        Ok(())
    }

    async fn record_action(&mut self, entry: &ActionLogEntry) -> Result<(), StoreError> {
        self.writes.push(StagedWrite::Action(entry.clone()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        {
            let mut faults = self.inner.faults.lock().await;
            if faults.failing_commits > 0 {
                faults.failing_commits -= 1;
                debug!(pending_writes = self.writes.len(), "Injected commit failure");
                return Err(StoreError::Unavailable("injected commit failure".to_string()));
            }
        }

        let mut this = *self;
        let writes = std::mem::take(&mut this.writes);
        {
            let mut state = this.inner.state.write().await;
            for write in writes {
                write.apply(&mut state);
            }
            state.commits += 1;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!(discarded_writes = self.writes.len(), "Rolling back in-memory transaction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn seeded() -> InMemoryDeviceStore {
        let store = InMemoryDeviceStore::new();
        store
            .insert_camera(Camera::new(1, "CAM-1").with_position(1.0, 2.0))
            .await;
        store.insert_dvr(Dvr::new(10, "DVR-10")).await;
        store
    }

    fn lock_count(store: &InMemoryDeviceStore) -> usize {
        store.inner.row_locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_writes_visible_only_after_commit() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.lock_camera(1).await.unwrap();
        tx.write_camera_position(1, GeoPoint::new(5.0, 6.0), LocationSource::Explicit)
            .await
            .unwrap();

        let committed = store.find_camera(1).await.unwrap().unwrap();
        assert_eq!(committed.latitude, Some(1.0));

        tx.commit().await.unwrap();
        let committed = store.find_camera(1).await.unwrap().unwrap();
        assert_eq!(committed.latitude, Some(5.0));
        assert_eq!(store.commit_count().await, 1);
    }

    #[tokio::test]
    async fn test_transaction_reads_its_own_writes() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.lock_camera(1).await.unwrap();
        tx.set_camera_dvr(1, Some(10)).await.unwrap();
        let camera = tx.lock_camera(1).await.unwrap().unwrap();
        assert_eq!(camera.dvr_id, Some(10));
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() {
        let store = seeded().await;

        let mut tx = store.begin().await.unwrap();
        tx.lock_dvr(10).await.unwrap();
        tx.write_dvr_position(10, GeoPoint::new(3.0, 4.0)).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.lock_dvr(10).await.unwrap();
        tx.write_dvr_position(10, GeoPoint::new(3.0, 4.0)).await.unwrap();
        drop(tx);

        let dvr = store.find_dvr(10).await.unwrap().unwrap();
        assert_eq!(dvr.latitude, None);
        assert_eq!(store.commit_count().await, 0);
    }

    #[tokio::test]
    async fn test_row_lock_blocks_second_transaction() {
        let store = seeded().await;
        let mut first = store.begin().await.unwrap();
        first.lock_camera(1).await.unwrap();

        let contender = store.clone();
        let handle = tokio::spawn(async move {
            let mut second = contender.begin().await.unwrap();
            second.lock_camera(1).await.unwrap()
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());

        first
            .write_camera_position(1, GeoPoint::new(7.0, 8.0), LocationSource::Explicit)
            .await
            .unwrap();
        first.commit().await.unwrap();

        let seen = handle.await.unwrap().unwrap();
        assert_eq!(seen.latitude, Some(7.0));
    }

    #[tokio::test]
    async fn test_coverage_write_is_staged() {
        let store = seeded().await;
        let coverage = CoverageParams::new(120.0, 60.0, 90.0);

        let mut tx = store.begin().await.unwrap();
        tx.lock_camera(1).await.unwrap();
        tx.write_camera_coverage(1, coverage).await.unwrap();
        assert_eq!(tx.lock_camera(1).await.unwrap().unwrap().coverage, coverage);
        assert_eq!(
            store.find_camera(1).await.unwrap().unwrap().coverage,
            CoverageParams::default()
        );

        tx.commit().await.unwrap();
        assert_eq!(store.find_camera(1).await.unwrap().unwrap().coverage, coverage);
    }

    #[tokio::test]
    async fn test_row_locks_are_pruned_when_released() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.lock_camera(1).await.unwrap();
        tx.lock_dvr(10).await.unwrap();
        assert_eq!(lock_count(&store), 2);
        tx.commit().await.unwrap();
        assert_eq!(lock_count(&store), 0);

        let mut tx = store.begin().await.unwrap();
        tx.lock_camera(1).await.unwrap();
        drop(tx);
        assert_eq!(lock_count(&store), 0);

        store.fail_next_commits(1).await;
        let mut tx = store.begin().await.unwrap();
        tx.lock_camera(1).await.unwrap();
        assert!(tx.commit().await.is_err());
        assert_eq!(lock_count(&store), 0);
    }

    #[tokio::test]
    async fn test_row_lock_kept_while_another_transaction_waits() {
        let store = seeded().await;
        let mut first = store.begin().await.unwrap();
        first.lock_camera(1).await.unwrap();

        let contender = store.clone();
        let handle = tokio::spawn(async move {
            let mut second = contender.begin().await.unwrap();
            second.lock_camera(1).await.unwrap();
            second.commit().await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        first.rollback().await.unwrap();
        assert_eq!(lock_count(&store), 1);

        handle.await.unwrap();
        assert_eq!(lock_count(&store), 0);
    }

    #[tokio::test]
    async fn test_missing_rows_return_none() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();
        assert!(tx.lock_camera(99).await.unwrap().is_none());
        assert!(tx.lock_dvr(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_commit_failures() {
        let store = seeded().await;
        store.fail_next_commits(1).await;

        let mut tx = store.begin().await.unwrap();
        tx.lock_camera(1).await.unwrap();
        tx.write_camera_position(1, GeoPoint::new(9.0, 9.0), LocationSource::Explicit)
            .await
            .unwrap();
        assert!(matches!(tx.commit().await, Err(StoreError::Unavailable(_))));

        let tx = store.begin().await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.commit_count().await, 1);
        assert_eq!(store.find_camera(1).await.unwrap().unwrap().latitude, Some(1.0));
    }

    #[tokio::test]
    async fn test_blocked_device_fails_to_lock() {
        let store = seeded().await;
        store.block_device(DeviceRef::camera(1)).await;
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.lock_camera(1).await,
            Err(StoreError::LockContention(d)) if d == DeviceRef::camera(1)
        ));

        store.unblock_device(DeviceRef::camera(1)).await;
        assert!(tx.lock_camera(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_actions_committed_in_order() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();
        tx.record_action(&ActionLogEntry::assignment(1, 10, None))
            .await
            .unwrap();
        tx.record_action(&ActionLogEntry::unassignment(1, Some(10)))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let log = store.action_log().await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].device, DeviceRef::camera(1));
        assert_eq!(log[1].details["previous_dvr_id"], 10);
    }
}
