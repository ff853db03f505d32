//! Action log repository for database operations.

use sqlx::PgPool;

use crate::entities::ActionLogEntity;
use crate::metrics::QueryTimer;
use domain::models::DeviceRef;

/// Repository for reading the action log.
///
/// Entries are written by `PgDeviceTransaction` inside the mutating
/// transaction, never through this repository.
#[derive(Clone)]
pub struct ActionLogRepository {
    pool: PgPool,
}

impl ActionLogRepository {
    /// Creates a new ActionLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent entries for a device, newest first.
    pub async fn list_for_device(
        &self,
        device: DeviceRef,
        limit: i64,
    ) -> Result<Vec<ActionLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_action_log_for_device");
        let result = sqlx::query_as::<_, ActionLogEntity>(
            r#"
            SELECT id, action_type, device_kind, device_id, details, recorded_at
            FROM action_log
            WHERE device_kind = $1 AND device_id = $2
            ORDER BY recorded_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(device.kind.as_str())
        .bind(device.id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
