//! Worker HTTP surface

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use hive_common::http;
use hive_proto::{HealthResponse, NodeRole, WorkerReply, DISPATCH_PATH, HEALTH_PATH, WORKER_SUCCESS_MSG};
use std::sync::Arc;
use tracing::debug;

/// Shared application state
pub struct AppState {
    pub worker_id: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(DISPATCH_PATH, post(infer))
        .route("/metrics", get(http::metrics))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::alive(NodeRole::Worker))
}

// No model runs here; the reply names the worker that served it.
async fn infer(State(state): State<Arc<AppState>>) -> Json<WorkerReply> {
    debug!("Serving forwarded request");
    Json(WorkerReply {
        msg: WORKER_SUCCESS_MSG.to_string(),
        source: state.worker_id.clone(),
    })
}
