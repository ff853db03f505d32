//! DVR repository for database operations.

use sqlx::PgPool;

use crate::entities::DvrEntity;
use crate::metrics::QueryTimer;

pub(crate) const DVR_COLUMNS: &str =
    "id, default_name, custom_name, latitude, longitude, created_at, updated_at";

/// Repository for DVR-related database operations.
#[derive(Clone)]
pub struct DvrRepository {
    pool: PgPool,
}

impl DvrRepository {
    /// Creates a new DvrRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Register a new, unpositioned DVR.
    pub async fn create(
        &self,
        default_name: &str,
        custom_name: Option<&str>,
    ) -> Result<DvrEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_dvr");
        let result = sqlx::query_as::<_, DvrEntity>(&format!(
            r#"
            INSERT INTO dvrs (default_name, custom_name)
            VALUES ($1, $2)
            RETURNING {DVR_COLUMNS}
            "#
        ))
        .bind(default_name)
        .bind(custom_name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a DVR by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<DvrEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_dvr_by_id");
        let result = sqlx::query_as::<_, DvrEntity>(&format!(
            r#"
            SELECT {DVR_COLUMNS}
            FROM dvrs
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List every DVR.
    pub async fn list_all(&self) -> Result<Vec<DvrEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_dvrs");
        let result = sqlx::query_as::<_, DvrEntity>(&format!(
            r#"
            SELECT {DVR_COLUMNS}
            FROM dvrs
            ORDER BY id
            "#
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
