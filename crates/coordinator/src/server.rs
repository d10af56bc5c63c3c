//! Coordinator HTTP surface

use crate::router::DispatchRouter;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use hive_common::error::Result;
use hive_common::{http, EventLog, Registration, RegistryHandle};
use hive_proto::{
    HealthResponse, NodeRole, RegisterRequest, RegisterResponse, WorkerList, DISPATCH_PATH,
    HEALTH_PATH, REGISTER_PATH,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared application state
pub struct AppState {
    pub registry: RegistryHandle,
    pub router: DispatchRouter,
    pub journal: EventLog,
}

impl AppState {
    pub fn new(router: DispatchRouter, journal: EventLog) -> Self {
        Self {
            registry: router.registry().clone(),
            router,
            journal,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(REGISTER_PATH, post(register))
        .route(DISPATCH_PATH, post(dispatch))
        .route("/workers", get(list_workers))
        .route("/metrics", get(http::metrics))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::alive(NodeRole::Coordinator))
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>> {
    let record = http::parse_registration(payload)?;

    match state.registry.register(record.clone()).await? {
        Registration::Added => {
            info!("New worker connected: {} at {}", record.id, record.url);
            if let Err(e) = state
                .journal
                .append(&format!("worker {} joined at {}", record.id, record.url))
                .await
            {
                warn!("Failed to journal arrival of {}: {}", record.id, e);
            }
        }
        Registration::Duplicate => debug!("Worker {} already registered", record.id),
    }

    Ok(Json(RegisterResponse {
        status: "ACCEPTED".to_string(),
    }))
}

async fn dispatch(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    state.router.dispatch_body(&body).await.map(Json)
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
