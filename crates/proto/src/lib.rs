//! Hive wire protocol
//!
//! JSON message types exchanged between coordinator, worker and standby nodes.
//! Dispatch payloads are opaque and travel as `serde_json::Value`.

use serde::{Deserialize, Serialize};

/// Path of the dispatch endpoint, identical on every node that serves it.
pub const DISPATCH_PATH: &str = "/v1/chat/completions";

/// Path of the registration endpoint on command nodes.
pub const REGISTER_PATH: &str = "/register";

/// Path of the liveness probe.
pub const HEALTH_PATH: &str = "/health";

/// Marker returned by a worker that served a request.
pub const WORKER_SUCCESS_MSG: &str = "HIVE_DRONE_SUCCESS";

/// Role a node plays in the hive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeRole {
    Coordinator,
    Worker,
    Standby,
}

/// Worker self-registration, sent to every command node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Worker identifier, unique within a registry
    pub id: String,

    /// Callback address the command node forwards requests to
    pub url: String,
}

/// Registration acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub status: String,
}

/// Liveness probe answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub role: NodeRole,

    /// Only reported by standby nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_active: Option<bool>,
}

impl HealthResponse {
    pub fn alive(role: NodeRole) -> Self {
        Self {
            status: "ALIVE".to_string(),
            role,
            backup_active: None,
        }
    }
}

/// Structured error carried inside a successful response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

/// Reply produced by a worker's dispatch endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReply {
    pub msg: String,
    pub source: String,
}

/// Snapshot of a node's registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerList {
    pub workers: Vec<RegisterRequest>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_omits_backup_flag_for_primary() {
        let json = serde_json::to_value(HealthResponse::alive(NodeRole::Coordinator)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "ALIVE", "role": "COORDINATOR"}));
    }

    #[test]
    fn test_register_request_requires_both_fields() {
        let parsed: Result<RegisterRequest, _> =
            serde_json::from_value(serde_json::json!({"id": "worker-1"}));
        assert!(parsed.is_err());
    }
}
