//! Outbound HTTP calls between nodes
//!
//! Thin wrapper over a shared `reqwest::Client`. Every call carries its own
//! timeout; failures are mapped onto the Hive error taxonomy at this seam.

use crate::error::{HiveError, Result};
use crate::registry::WorkerRecord;
use hive_proto::{RegisterRequest, RegisterResponse, DISPATCH_PATH, HEALTH_PATH, REGISTER_PATH};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// HTTP client shared by a node's components
#[derive(Debug, Clone)]
pub struct HiveClient {
    client: Client,
}

fn describe(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("timed out after {:?}", timeout)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

impl HiveClient {
    /// Create a new client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| HiveError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Register a worker with the command node at `target`
    pub async fn register(
        &self,
        target: &str,
        request: &RegisterRequest,
        timeout: Duration,
    ) -> Result<RegisterResponse> {
        let url = join(target, REGISTER_PATH);
        debug!("Registering {} with {}", request.id, url);

        let resp = self
            .client
            .post(&url)
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| HiveError::target_unreachable(target, describe(&e, timeout)))?;

        if !resp.status().is_success() {
            return Err(HiveError::target_unreachable(
                target,
                format!("registration rejected with status {}", resp.status()),
            ));
        }

        resp.json::<RegisterResponse>()
            .await
            .map_err(|e| HiveError::target_unreachable(target, format!("invalid acknowledgement: {}", e)))
    }

    /// Liveness probe against the node at `base`.
    ///
    /// Any HTTP answer counts as alive; only connection errors and timeouts fail.
    pub async fn probe(&self, base: &str, timeout: Duration) -> Result<()> {
        let url = join(base, HEALTH_PATH);
        let resp = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| HiveError::upstream(base, describe(&e, timeout)))?;

        trace!("Probe {} answered {}", url, resp.status());
        Ok(())
    }

    /// Forward an opaque payload to a worker and return its JSON answer verbatim
    pub async fn forward(&self, worker: &WorkerRecord, payload: &Value, timeout: Duration) -> Result<Value> {
        let url = join(&worker.url, DISPATCH_PATH);

        let resp = self
            .client
            .post(&url)
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| HiveError::upstream(&worker.id, describe(&e, timeout)))?;

        resp.json::<Value>()
            .await
            .map_err(|e| HiveError::upstream(&worker.id, format!("malformed response: {}", describe(&e, timeout))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_strips_trailing_slash() {
        assert_eq!(join("http://10.0.0.2:8081/", DISPATCH_PATH), "http://10.0.0.2:8081/v1/chat/completions");
        assert_eq!(join("http://10.0.0.1:8000", HEALTH_PATH), "http://10.0.0.1:8000/health");
    }

    #[tokio::test]
    async fn test_probe_refused_connection_fails() {
        // bind then release so nothing listens on the port
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HiveClient::new().unwrap();
        let result = client
            .probe(&format!("http://{}", addr), Duration::from_millis(500))
            .await;

        assert!(matches!(result, Err(HiveError::UpstreamUnreachable { .. })));
    }
}
