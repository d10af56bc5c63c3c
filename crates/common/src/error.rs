//! Common error types for Hive
//!
//! This module defines all error types used across the Hive nodes.
//! Errors convert into HTTP responses for the node surfaces; dispatch failures
//! travel inside a successful envelope as an `{error}` payload.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hive_proto::ErrorPayload;
use std::net::AddrParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Hive
#[derive(Error, Debug)]
pub enum HiveError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No configuration file at startup
    #[error("Configuration file not found at {}; run hive-fabricator first", .path.display())]
    ConfigurationMissing { path: PathBuf },

    /// Request body is not usable
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Registry empty at dispatch time
    #[error("No workers available")]
    NoWorkersAvailable,

    /// Forward call failed or timed out
    #[error("Worker connection failed ({worker}): {reason}")]
    UpstreamUnreachable { worker: String, reason: String },

    /// Announce attempt failed
    #[error("Command node {target} unreachable: {reason}")]
    RegistrationTargetUnreachable { target: String, reason: String },

    /// Dispatch attempted on a standby that has not been promoted
    #[error("Standby is passive; the coordinator is still in command")]
    StandbyPassive,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AddrParseError> for HiveError {
    fn from(err: AddrParseError) -> Self {
        HiveError::Parse(err.to_string())
    }
}

impl HiveError {
    /// HTTP status used when the error reaches a caller.
    ///
    /// Dispatch-path failures keep a 200 envelope so callers always receive a
    /// response object with an `error` field.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HiveError::NoWorkersAvailable
            | HiveError::UpstreamUnreachable { .. }
            | HiveError::StandbyPassive => StatusCode::OK,
            HiveError::MalformedRequest(_) | HiveError::Parse(_) => StatusCode::BAD_REQUEST,
            HiveError::RegistrationTargetUnreachable { .. } => StatusCode::BAD_GATEWAY,
            HiveError::Config(_)
            | HiveError::ConfigurationMissing { .. }
            | HiveError::Serialization(_)
            | HiveError::Io(_)
            | HiveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Structured payload for the response body
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        HiveError::Config(msg.into())
    }

    /// Create a malformed request error
    pub fn malformed(msg: impl Into<String>) -> Self {
        HiveError::MalformedRequest(msg.into())
    }

    /// Create an upstream error for a worker
    pub fn upstream(worker: impl Into<String>, reason: impl Into<String>) -> Self {
        HiveError::UpstreamUnreachable {
            worker: worker.into(),
            reason: reason.into(),
        }
    }

    /// Create an announce error for a command node
    pub fn target_unreachable(target: impl Into<String>, reason: impl Into<String>) -> Self {
        HiveError::RegistrationTargetUnreachable {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        HiveError::Internal(msg.into())
    }
}

impl IntoResponse for HiveError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_payload())).into_response()
    }
}

/// Result type alias for Hive operations
pub type Result<T> = std::result::Result<T, HiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_failures_keep_success_envelope() {
        assert_eq!(HiveError::NoWorkersAvailable.status_code(), StatusCode::OK);
        assert_eq!(
            HiveError::upstream("worker-1", "connection refused").status_code(),
            StatusCode::OK
        );
        assert_eq!(HiveError::StandbyPassive.status_code(), StatusCode::OK);
    }

    #[test]
    fn test_malformed_request_is_client_error() {
        let err = HiveError::malformed("missing field `url`");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_payload().error, "Malformed request: missing field `url`");
    }

    #[test]
    fn test_no_workers_payload_text() {
        assert_eq!(HiveError::NoWorkersAvailable.to_payload().error, "No workers available");
    }
}
