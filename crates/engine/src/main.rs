use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use camera_map_engine::config::Config;
use camera_map_engine::{logging, SpatialEngine};
use persistence::PgDeviceStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    logging::init_logging(&config.logging)?;

    info!("Starting camera map engine v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;

    let store = Arc::new(PgDeviceStore::new(pool.clone()));
    let engine = SpatialEngine::new(store, config.retry.policy());

    if config.maintenance.audit_on_start {
        let audit = engine.audit_assignments().await?;
        if audit.is_consistent() {
            info!(
                cameras = %audit.cameras_checked,
                dvrs = %audit.dvrs_checked,
                "Assignments consistent"
            );
        } else {
            warn!(issues = %audit.issues.len(), "Assignment audit found issues");
        }
    }

    if config.maintenance.reconcile_on_start {
        let summaries = engine.reconcile().await?;
        let failed: usize = summaries.iter().map(|s| s.failed.len()).sum();
        info!(dvrs = %summaries.len(), failed_cameras = %failed, "Reconciliation finished");
    }

    persistence::metrics::record_pool_metrics(&pool);
    pool.close().await;

    Ok(())
}
