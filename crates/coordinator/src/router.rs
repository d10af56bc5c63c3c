//! Request routing and load balancing
//!
//! Round-robin dispatch over the node's registry. One forward attempt per
//! request: a failed or timed-out worker is reported back to the caller, never
//! retried against another worker. The cursor advances on every selection,
//! including selections whose forward then fails.

use hive_common::error::{HiveError, Result};
use hive_common::{http, HiveClient, RegistryHandle, WorkerRecord, METRICS};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Router for distributing requests across workers
#[derive(Debug, Clone)]
pub struct DispatchRouter {
    /// Registered workers
    registry: RegistryHandle,

    /// Outbound client
    client: HiveClient,

    /// Bound on a single forward call
    forward_timeout: Duration,
}

impl DispatchRouter {
    /// Create a new router
    pub fn new(registry: RegistryHandle, client: HiveClient, forward_timeout: Duration) -> Self {
        Self {
            registry,
            client,
            forward_timeout,
        }
    }

    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }

    /// Select the next worker in rotation
    pub async fn select_worker(&self) -> Result<WorkerRecord> {
        self.registry
            .next_target()
            .await?
            .ok_or(HiveError::NoWorkersAvailable)
    }

    /// Forward `payload` to the next worker and return its answer verbatim
    pub async fn dispatch(&self, payload: Value) -> Result<Value> {
        METRICS.dispatch.requests_total.inc();
        let target = self.claim_target().await?;
        self.forward(target, &payload).await
    }

    /// Like [`dispatch`](Self::dispatch) for a raw request body.
    ///
    /// An empty registry is reported before the body is looked at.
    pub async fn dispatch_body(&self, body: &[u8]) -> Result<Value> {
        METRICS.dispatch.requests_total.inc();
        let target = self.claim_target().await?;
        let payload = http::parse_payload(body).map_err(|e| {
            warn!("Dispatch rejected: {}", e);
            e
        })?;
        self.forward(target, &payload).await
    }

    async fn claim_target(&self) -> Result<WorkerRecord> {
        self.select_worker().await.map_err(|e| {
            if matches!(e, HiveError::NoWorkersAvailable) {
                METRICS.dispatch.no_workers_available.inc();
            }
            warn!("Dispatch rejected: {}", e);
            e
        })
    }

    async fn forward(&self, target: WorkerRecord, payload: &Value) -> Result<Value> {
        debug!("Forwarding request to {} at {}", target.id, target.url);

        let timer = METRICS.dispatch.forward_duration.start_timer();
        let result = self.client.forward(&target, payload, self.forward_timeout).await;
        timer.observe_duration();

        match result {
            Ok(response) => {
                METRICS.dispatch.requests_forwarded.inc();
                Ok(response)
            }
            Err(e) => {
                METRICS.dispatch.upstream_failures.inc();
                warn!("Forward to {} failed: {}", target.id, e);
                Err(e)
            }
        }
    }
}
