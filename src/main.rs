//! Spartanville campus community service
//!
//! Main application entry point

use std::sync::Arc;

use tracing::{debug, error, info};

use spartanville::{
    config::Settings,
    store::{postgres, PgEventStore},
    utils::{helpers, logging},
    ServiceFactory,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting Spartanville service...");

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = postgres::create_pool(&settings.database).await?;
    postgres::run_migrations(&db_pool).await?;

    // Initialize Redis connection
    info!("Connecting to Redis...");
    let redis_client = redis::Client::open(settings.redis.url.clone())?;

    // Initialize the event store and services
    let store = Arc::new(PgEventStore::new(db_pool));
    info!("Initializing services...");
    let services = ServiceFactory::new(store, settings.clone(), Some(redis_client)).await?;

    let health = services.health_check().await;
    if !health.is_healthy() {
        error!(issues = ?health.get_issues(), "Service health check failed");
        anyhow::bail!("unhealthy at startup");
    }
    for issue in health.get_issues() {
        tracing::warn!(issue = %issue, "Degraded service");
    }

    debug!(
        map_embed_url = %helpers::campus_map_embed_url(&settings.campus),
        "Campus configuration loaded"
    );

    info!(campus = %settings.campus.name, "Spartanville service is ready");

    // Run until interrupted
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    services.sync_engine.shutdown().await;

    info!("Spartanville service has been shut down.");
    Ok(())
}
