//! Database metrics collection.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record how long a named store query took.
pub fn record_query_duration(query_name: &'static str, duration_secs: f64) {
    histogram!("database_query_duration_seconds", "query" => query_name).record(duration_secs);
}

/// Record connection pool gauges (active, idle, total).
///
/// Called by the maintenance binary once its startup work is done.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times one store query and records it as `database_query_duration_seconds`.
///
/// ```ignore
/// let timer = QueryTimer::new("find_camera_by_id");
/// let result = sqlx::query_as::<_, CameraEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_creation() {
        let timer = QueryTimer::new("lock_camera");
        assert_eq!(timer.query_name, "lock_camera");
        assert!(timer.start.elapsed().as_secs() < 1);
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        QueryTimer::new("list_cameras").record();
        record_query_duration("list_dvrs", 0.002);
    }
}
