//! Postgres-backed device store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use domain::models::{ActionLogEntry, Camera, CoverageParams, Dvr, GeoPoint, LocationSource};
use domain::services::{DeviceStore, DeviceTransaction};
use domain::StoreError;

use crate::entities::{CameraEntity, DvrEntity};
use crate::error::store_error;
use crate::metrics::QueryTimer;
use crate::repositories::camera::CAMERA_COLUMNS;
use crate::repositories::dvr::DVR_COLUMNS;
use crate::repositories::{CameraRepository, DvrRepository};

/// Device store over the cameras, dvrs and action_log tables.
#[derive(Clone)]
pub struct PgDeviceStore {
    pool: PgPool,
    cameras: CameraRepository,
    dvrs: DvrRepository,
}

impl PgDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            cameras: CameraRepository::new(pool.clone()),
            dvrs: DvrRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DeviceStore for PgDeviceStore {
    async fn begin(&self) -> Result<Box<dyn DeviceTransaction>, StoreError> {
        let tx = self.pool.begin().await.map_err(store_error)?;
        Ok(Box::new(PgDeviceTransaction { tx }))
    }

    async fn find_camera(&self, id: i64) -> Result<Option<Camera>, StoreError> {
        let entity = self.cameras.find_by_id(id).await.map_err(store_error)?;
        Ok(entity.map(Into::into))
    }

    async fn find_dvr(&self, id: i64) -> Result<Option<Dvr>, StoreError> {
        let entity = self.dvrs.find_by_id(id).await.map_err(store_error)?;
        Ok(entity.map(Into::into))
    }

    async fn find_cameras_by_dvr(&self, dvr_id: i64) -> Result<Vec<Camera>, StoreError> {
        let entities = self.cameras.find_by_dvr(dvr_id).await.map_err(store_error)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>, StoreError> {
        let entities = self.cameras.list_all().await.map_err(store_error)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn list_dvrs(&self) -> Result<Vec<Dvr>, StoreError> {
        let entities = self.dvrs.list_all().await.map_err(store_error)?;
        Ok(entities.into_iter().map(Into::into).collect())
    }
}

/// An open Postgres transaction.
///
/// Row locks are taken with `SELECT ... FOR UPDATE`. Dropping the value
/// without committing rolls the transaction back.
pub struct PgDeviceTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl DeviceTransaction for PgDeviceTransaction {
    async fn lock_camera(&mut self, id: i64) -> Result<Option<Camera>, StoreError> {
        let timer = QueryTimer::new("lock_camera");
        let result = sqlx::query_as::<_, CameraEntity>(&format!(
            r#"
            SELECT {CAMERA_COLUMNS}
            FROM cameras
            WHERE id = $1
            FOR UPDATE
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn lock_dvr(&mut self, id: i64) -> Result<Option<Dvr>, StoreError> {
        let timer = QueryTimer::new("lock_dvr");
        let result = sqlx::query_as::<_, DvrEntity>(&format!(
            r#"
            SELECT {DVR_COLUMNS}
            FROM dvrs
            WHERE id = $1
            FOR UPDATE
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await;
        timer.record();
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn write_camera_position(
        &mut self,
        id: i64,
        position: GeoPoint,
        source: LocationSource,
    ) -> Result<(), StoreError> {
        let timer = QueryTimer::new("update_camera_position");
        let result = sqlx::query(
            r#"
            UPDATE cameras
            SET latitude = $2, longitude = $3, location_source = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(position.latitude)
        .bind(position.longitude)
        .bind(source.as_str())
        .execute(&mut *self.tx)
        .await;
        timer.record();
        result.map_err(store_error)?;
        Ok(())
    }

    async fn write_dvr_position(&mut self, id: i64, position: GeoPoint) -> Result<(), StoreError> {
        let timer = QueryTimer::new("update_dvr_position");
        let result = sqlx::query(
            r#"
            UPDATE dvrs
            SET latitude = $2, longitude = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(position.latitude)
        .bind(position.longitude)
        .execute(&mut *self.tx)
        .await;
        timer.record();
        result.map_err(store_error)?;
        Ok(())
    }

    async fn write_camera_coverage(
        &mut self,
        id: i64,
        coverage: CoverageParams,
    ) -> Result<(), StoreError> {
        let timer = QueryTimer::new("update_camera_coverage");
        let result = sqlx::query(
            r#"
            UPDATE cameras
            SET coverage_radius = $2, field_of_view_angle = $3, coverage_direction = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(coverage.radius)
        .bind(coverage.field_of_view)
        .bind(coverage.direction)
        .execute(&mut *self.tx)
        .await;
        timer.record();
        result.map_err(store_error)?;
        Ok(())
    }

    async fn set_camera_dvr(
        &mut self,
        camera_id: i64,
        dvr_id: Option<i64>,
    ) -> Result<(), StoreError> {
        let timer = QueryTimer::new("update_camera_dvr");
        let result = sqlx::query(
            r#"
            UPDATE cameras
            SET dvr_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(camera_id)
        .bind(dvr_id)
        .execute(&mut *self.tx)
        .await;
        timer.record();
        result.map_err(store_error)?;
        Ok(())
    }

    async fn record_action(&mut self, entry: &ActionLogEntry) -> Result<(), StoreError> {
        let timer = QueryTimer::new("insert_action_log");
        let result = sqlx::query(
            r#"
            INSERT INTO action_log (action_type, device_kind, device_id, details, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.action.as_str())
        .bind(entry.device.kind.as_str())
        .bind(entry.device.id)
        .bind(&entry.details)
        .bind(entry.recorded_at)
        .execute(&mut *self.tx)
        .await;
        timer.record();
        result.map_err(store_error)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!("Rolling back device transaction");
        self.tx.rollback().await.map_err(store_error)
    }
}
