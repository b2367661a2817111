//! Traffic Dashboard - live traffic status service
//!
//! Accepts sensor messages for one intersection, classifies vehicle counts
//! into severity bands and serves the live snapshot, history and alerts to
//! dashboard clients.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use traffic_core::{
    health::{Component, HealthRegistry},
    observability::StructuredLogger,
    state::run_maintenance,
    DashboardState,
};
use traffic_dashboard::{api, config::DashboardConfig};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, filtered by RUST_LOG
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting traffic-dashboard");

    let config = DashboardConfig::load()?;
    info!(
        intersection = %config.intersection_id,
        low_max = config.thresholds.low_max,
        medium_max = config.thresholds.medium_max,
        "Dashboard configured"
    );

    let health_registry = HealthRegistry::new();
    for component in Component::ALL {
        health_registry.register(component).await;
    }

    let logger = StructuredLogger::new(&config.intersection_id);
    logger.log_startup(SERVICE_VERSION, config.port);

    let dashboard =
        DashboardState::new(config.state_config()).context("Failed to initialize state")?;

    let app_state = Arc::new(api::AppState::new(
        dashboard.clone(),
        health_registry.clone(),
    ));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let maintenance_handle = tokio::spawn(run_maintenance(
        dashboard,
        health_registry.clone(),
        config.maintenance_interval(),
        shutdown_tx.subscribe(),
    ));
    let api_handle = tokio::spawn(api::serve(
        config.port,
        app_state,
        shutdown_tx.subscribe(),
    ));

    health_registry.set_ready(true).await;

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    health_registry.set_ready(false).await;
    let _ = shutdown_tx.send(());

    match api_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "API server exited with error"),
        Err(e) => error!(error = %e, "API server task panicked"),
    }
    let _ = maintenance_handle.await;

    info!("Shutdown complete");
    Ok(())
}
