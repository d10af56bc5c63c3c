//! HTTP surface helpers shared by every node
//!
//! Request validation for the JSON endpoints, the `/metrics` handler and the
//! serve loop with ctrl-c shutdown.

use crate::error::{HiveError, Result};
use crate::metrics::METRICS;
use crate::registry::WorkerRecord;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Json, Router};
use hive_proto::RegisterRequest;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Validate a registration body into a record
pub fn parse_registration(
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<WorkerRecord> {
    let Json(request) = payload.map_err(|e| HiveError::malformed(e.body_text()))?;

    if request.id.trim().is_empty() {
        return Err(HiveError::malformed("worker id must not be empty"));
    }
    if request.url.trim().is_empty() {
        return Err(HiveError::malformed("worker url must not be empty"));
    }

    Ok(request.into())
}

/// Parse an opaque JSON payload from a raw body.
///
/// The `Content-Type` header is not consulted; callers routinely post JSON
/// labelled as form data or plain text.
pub fn parse_payload(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| HiveError::malformed(format!("body is not JSON: {}", e)))
}

/// Prometheus exposition
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.render(),
    )
}

/// Serve `router` on `listener` until ctrl-c
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => {
            error!("Failed to install ctrl-c handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_registration_rejects_blank_url() {
        let payload = Ok(Json(RegisterRequest {
            id: "worker-1".to_string(),
            url: "  ".to_string(),
        }));

        let err = parse_registration(payload).unwrap_err();

        assert!(matches!(err, HiveError::MalformedRequest(_)));
    }

    #[test]
    fn test_parse_registration_accepts_complete_body() {
        let payload = Ok(Json(RegisterRequest {
            id: "worker-1".to_string(),
            url: "http://10.0.0.2:8081".to_string(),
        }));

        let record = parse_registration(payload).unwrap();

        assert_eq!(record, WorkerRecord::new("worker-1", "http://10.0.0.2:8081"));
    }

    #[test]
    fn test_parse_payload_ignores_labelling() {
        let value = parse_payload(br#"{"prompt": "hi"}"#).unwrap();

        assert_eq!(value["prompt"], "hi");
    }

    #[test]
    fn test_parse_payload_rejects_garbage() {
        assert!(matches!(parse_payload(b"prompt=hi"), Err(HiveError::MalformedRequest(_))));
        assert!(matches!(parse_payload(b""), Err(HiveError::MalformedRequest(_))));
    }
}
