//! Standby HTTP surface
//!
//! Mirrors the coordinator's registration endpoint, archives records posted to
//! `/write`, and serves dispatch only while it holds backup command.

use crate::monitor::FailoverMonitor;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use hive_common::error::{HiveError, Result};
use hive_common::{http, EventLog, Registration, RegistryHandle};
use hive_coordinator::DispatchRouter;
use hive_proto::{
    HealthResponse, NodeRole, RegisterRequest, RegisterResponse, WorkerList, DISPATCH_PATH,
    HEALTH_PATH, REGISTER_PATH,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared application state
pub struct AppState {
    pub registry: RegistryHandle,
    pub router: DispatchRouter,
    pub monitor: Arc<FailoverMonitor>,
    pub archive: EventLog,
}

impl AppState {
    pub fn new(router: DispatchRouter, monitor: Arc<FailoverMonitor>, archive: EventLog) -> Self {
        Self {
            registry: router.registry().clone(),
            router,
            monitor,
            archive,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(REGISTER_PATH, post(register))
        .route(DISPATCH_PATH, post(dispatch))
        .route("/write", post(write))
        .route("/workers", get(list_workers))
        .route("/metrics", get(http::metrics))
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut health = HealthResponse::alive(NodeRole::Standby);
    health.backup_active = Some(state.monitor.is_backup_active());
    Json(health)
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>> {
    let record = http::parse_registration(payload)?;

    match state.registry.register(record.clone()).await? {
        Registration::Added => info!("Backup registry learned {} at {}", record.id, record.url),
        Registration::Duplicate => debug!("Worker {} already in backup registry", record.id),
    }

    Ok(Json(RegisterResponse {
        status: "ACCEPTED_BY_BACKUP".to_string(),
    }))
}

async fn dispatch(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    if !state.monitor.is_backup_active() {
        return Err(HiveError::StandbyPassive);
    }
    state.router.dispatch_body(&body).await.map(Json)
}

async fn write(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    let record = http::parse_payload(&body)?;
    state.archive.append(&serde_json::to_string(&record)?).await?;
    Ok(Json(serde_json::json!({"status": "recorded"})))
}

async fn list_workers(State(state): State<Arc<AppState>>) -> Result<Json<WorkerList>> {
    let workers: Vec<RegisterRequest> = state
        .registry
        .snapshot()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(WorkerList {
        count: workers.len(),
        workers,
    }))
}
