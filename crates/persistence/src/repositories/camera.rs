//! Camera repository for database operations.

use sqlx::PgPool;

use crate::entities::CameraEntity;
use crate::metrics::QueryTimer;
use domain::models::CoverageParams;

pub(crate) const CAMERA_COLUMNS: &str = "id, default_name, custom_name, latitude, longitude, \
     dvr_id, coverage_radius, field_of_view_angle, coverage_direction, location_source, \
     created_at, updated_at";

/// Repository for camera-related database operations.
#[derive(Clone)]
pub struct CameraRepository {
    pool: PgPool,
}

impl CameraRepository {
    /// Creates a new CameraRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Register a new, unpositioned camera.
    pub async fn create(
        &self,
        default_name: &str,
        custom_name: Option<&str>,
        coverage: CoverageParams,
    ) -> Result<CameraEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_camera");
        let result = sqlx::query_as::<_, CameraEntity>(&format!(
            r#"
            INSERT INTO cameras
                (default_name, custom_name, coverage_radius, field_of_view_angle, coverage_direction)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CAMERA_COLUMNS}
            "#
        ))
        .bind(default_name)
        .bind(custom_name)
        .bind(coverage.radius)
        .bind(coverage.field_of_view)
        .bind(coverage.direction)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a camera by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<CameraEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_camera_by_id");
        let result = sqlx::query_as::<_, CameraEntity>(&format!(
            r#"
            SELECT {CAMERA_COLUMNS}
            FROM cameras
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find all cameras assigned to a DVR.
    pub async fn find_by_dvr(&self, dvr_id: i64) -> Result<Vec<CameraEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_cameras_by_dvr");
        let result = sqlx::query_as::<_, CameraEntity>(&format!(
            r#"
            SELECT {CAMERA_COLUMNS}
            FROM cameras
            WHERE dvr_id = $1
            ORDER BY id
            "#
        ))
        .bind(dvr_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List every camera.
    pub async fn list_all(&self) -> Result<Vec<CameraEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_cameras");
        let result = sqlx::query_as::<_, CameraEntity>(&format!(
            r#"
            SELECT {CAMERA_COLUMNS}
            FROM cameras
            ORDER BY id
            "#
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
