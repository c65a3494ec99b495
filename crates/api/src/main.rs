use std::time::Duration;

use anyhow::{Context, Result};
use geobooker_api::{app, config::Config, jobs, middleware};
use tracing::{info, warn};

const JOB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;

    middleware::logging::init_logging(&config.logging)
        .context("failed to initialize logging")?;
    middleware::init_metrics().context("failed to install metrics recorder")?;

    info!("Starting Geobooker API v{}", env!("CARGO_PKG_VERSION"));

    // Lazy so the server still starts and serves empty ad pools while the
    // database is unreachable.
    let db_config = persistence::db::DatabaseConfig::from(&config.database);
    let pool =
        persistence::db::create_lazy_pool(&db_config).context("invalid database configuration")?;

    info!("Running database migrations...");
    match persistence::db::run_migrations(&pool).await {
        Ok(()) => info!("Migrations completed"),
        Err(e) => warn!(error = %e, "Migrations failed; continuing in degraded mode"),
    }

    let scheduler = if config.jobs.enabled {
        let mut scheduler = jobs::build_scheduler(&config.jobs, &pool);
        scheduler.start();
        Some(scheduler)
    } else {
        None
    };

    let addr = config.socket_addr().context("invalid server address")?;
    let app = app::create_app(config, pool);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown(JOB_SHUTDOWN_TIMEOUT).await;
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
