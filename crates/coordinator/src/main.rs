//! Hive Coordinator - Main Entry Point
//!
//! Loads the configuration, restores the registry seed and serves the
//! registration, dispatch and health endpoints.

use hive_common::registry::load_seed;
use hive_common::{http, EventLog, HiveClient, HiveConfig, Registry, RegistryHandle, Result};
use hive_coordinator::{build_router, AppState, DispatchRouter};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hive_coordinator=info,hive_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hive Coordinator");

    // Load configuration
    let config_path = HiveConfig::resolve_path();
    let config = HiveConfig::load(&config_path).map_err(|e| {
        error!("{}", e);
        e
    })?;

    info!(
        "Coordinator configuration loaded: bind={}:{}, vendor={}",
        config.bind_address, config.coordinator_port, config.vendor
    );

    let seed = load_seed(&config.registry_seed_path)?;
    let registry = RegistryHandle::spawn(Registry::with_seed(seed));
    let router = DispatchRouter::new(registry, HiveClient::new()?, config.dispatch_timeout());

    let journal = EventLog::open(&config.event_log_path).await?;
    journal.append("coordinator online").await?;

    let state = Arc::new(AppState::new(router, journal));

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.coordinator_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("External API: http://{}:{}/v1", hive_common::net::local_ip(), config.coordinator_port);

    http::serve(listener, build_router(state)).await?;

    info!("Hive Coordinator shutdown complete");
    Ok(())
}
