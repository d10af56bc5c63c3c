//! Hive Standby - Main Entry Point
//!
//! Serves the backup registry and archive endpoints and runs the coordinator
//! liveness monitor in the background.

use hive_common::registry::load_seed;
use hive_common::{http, EventLog, HiveClient, HiveConfig, Registry, RegistryHandle, Result};
use hive_coordinator::DispatchRouter;
use hive_standby::{build_router, AppState, FailoverMonitor, MonitorConfig};
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
                .unwrap_or_else(|_| "hive_standby=info,hive_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hive Standby");

    // Load configuration
    let config_path = HiveConfig::resolve_path();
    let config = HiveConfig::load(&config_path).map_err(|e| {
        error!("{}", e);
        e
    })?;

    info!(
        "Standby configuration loaded: bind={}:{}, coordinator={}",
        config.bind_address,
        config.standby_port,
        config.coordinator_url()
    );

    let client = HiveClient::new()?;
    let seed = load_seed(&config.registry_seed_path)?;
    let registry = RegistryHandle::spawn(Registry::with_seed(seed));
    let router = DispatchRouter::new(registry, client.clone(), config.dispatch_timeout());

    let journal = Arc::new(EventLog::open(&config.event_log_path).await?);
    journal.append("standby online").await?;
    let archive = EventLog::open(&config.archive_log_path).await?;

    let monitor = Arc::new(FailoverMonitor::new(MonitorConfig::from_config(&config)));
    let monitor_handle = monitor.clone().spawn(client, journal);

    let state = Arc::new(AppState::new(router, monitor, archive));

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.standby_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Hive archivist and backup commander online at {}", addr);

    let result = http::serve(listener, build_router(state)).await;

    monitor_handle.abort();
    info!("Hive Standby shutdown complete");
    result
}
