//! Hive Worker - Main Entry Point
//!
//! Starts the worker endpoint and announces the worker to its command nodes
//! in the background.

use hive_common::{http, net, HiveClient, HiveConfig, Result};
use hive_proto::RegisterRequest;
use hive_worker::{build_router, AnnounceConfig, AppState, Announcer};
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
                .unwrap_or_else(|_| "hive_worker=info,hive_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hive Worker");

    // Load configuration
    let config_path = HiveConfig::resolve_path();
    let config = HiveConfig::load(&config_path).map_err(|e| {
        error!("{}", e);
        e
    })?;

    let host = config
        .worker_advertise_addr
        .clone()
        .unwrap_or_else(|| net::local_ip().to_string());
    let registration = RegisterRequest {
        id: config.worker_id.clone(),
        url: config.worker_url(&host),
    };

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.worker_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Worker online: {} ({})", registration.id, registration.url);

    let announcer = Announcer::new(HiveClient::new()?, registration, AnnounceConfig::from_config(&config));
    let announce_handle = announcer.spawn();

    let state = Arc::new(AppState {
        worker_id: config.worker_id.clone(),
    });
    let result = http::serve(listener, build_router(state)).await;

    announce_handle.abort();
    info!("Hive Worker shutdown complete");
    result
}
