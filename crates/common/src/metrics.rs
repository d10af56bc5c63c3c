//! Metrics collection for Hive
//!
//! Prometheus counters and gauges shared by every node role, exposed on each
//! node's `/metrics` endpoint.

use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics registry for Hive
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    pub registry: Arc<Registry>,
    pub registry_ops: RegistryMetrics,
    pub dispatch: DispatchMetrics,
    pub failover: FailoverMetrics,
    pub announce: AnnounceMetrics,
}

/// Registration metrics (coordinator and standby)
#[derive(Debug, Clone)]
pub struct RegistryMetrics {
    /// Registrations that added a worker
    pub registrations_total: IntCounter,

    /// Registrations ignored because the id was already known
    pub duplicate_registrations_total: IntCounter,

    /// Workers currently in the registry
    pub registered_workers: IntGauge,
}

/// Dispatch metrics
#[derive(Debug, Clone)]
pub struct DispatchMetrics {
    /// Dispatch requests received
    pub requests_total: IntCounter,

    /// Dispatches answered by a worker
    pub requests_forwarded: IntCounter,

    /// Dispatches rejected because the registry was empty
    pub no_workers_available: IntCounter,

    /// Forward calls that failed or timed out
    pub upstream_failures: IntCounter,

    /// Forward round-trip time
    pub forward_duration: Histogram,
}

/// Standby failover metrics
#[derive(Debug, Clone)]
pub struct FailoverMetrics {
    /// Liveness probes sent
    pub probes_total: IntCounter,

    /// Liveness probes that failed
    pub probe_failures: IntCounter,

    /// 1 while the standby holds backup command
    pub backup_active: IntGauge,

    /// PASSIVE <-> BACKUP_ACTIVE transitions
    pub transitions_total: IntCounter,
}

/// Worker announce metrics
#[derive(Debug, Clone)]
pub struct AnnounceMetrics {
    /// Registration calls accepted by a command node
    pub accepted_total: IntCounter,

    /// Registration calls that failed
    pub failures_total: IntCounter,
}

lazy_static! {
    /// Global metrics registry instance
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let metric = IntCounter::new(name, help).unwrap();
    registry.register(Box::new(metric.clone())).unwrap();
    metric
}

fn gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
    let metric = IntGauge::new(name, help).unwrap();
    registry.register(Box::new(metric.clone())).unwrap();
    metric
}

impl MetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Self {
        let registry = Registry::new();

        let registry_ops = RegistryMetrics {
            registrations_total: counter(
                &registry,
                "hive_registrations_total",
                "Registrations that added a worker",
            ),
            duplicate_registrations_total: counter(
                &registry,
                "hive_duplicate_registrations_total",
                "Registrations ignored because the worker id was known",
            ),
            registered_workers: gauge(
                &registry,
                "hive_registered_workers",
                "Workers currently in the registry",
            ),
        };

        let forward_duration = Histogram::with_opts(
            HistogramOpts::new(
                "hive_forward_duration_seconds",
                "Round-trip time of forwarded dispatches",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )
        .unwrap();
        registry.register(Box::new(forward_duration.clone())).unwrap();

        let dispatch = DispatchMetrics {
            requests_total: counter(&registry, "hive_dispatch_requests_total", "Dispatch requests received"),
            requests_forwarded: counter(
                &registry,
                "hive_dispatch_forwarded_total",
                "Dispatches answered by a worker",
            ),
            no_workers_available: counter(
                &registry,
                "hive_dispatch_no_workers_total",
                "Dispatches rejected because no worker was registered",
            ),
            upstream_failures: counter(
                &registry,
                "hive_dispatch_upstream_failures_total",
                "Forward calls that failed or timed out",
            ),
            forward_duration,
        };

        let failover = FailoverMetrics {
            probes_total: counter(&registry, "hive_probes_total", "Liveness probes sent to the coordinator"),
            probe_failures: counter(&registry, "hive_probe_failures_total", "Liveness probes that failed"),
            backup_active: gauge(&registry, "hive_backup_active", "1 while the standby holds backup command"),
            transitions_total: counter(
                &registry,
                "hive_failover_transitions_total",
                "Standby state transitions",
            ),
        };

        let announce = AnnounceMetrics {
            accepted_total: counter(
                &registry,
                "hive_announce_accepted_total",
                "Registration calls accepted by a command node",
            ),
            failures_total: counter(
                &registry,
                "hive_announce_failures_total",
                "Registration calls that failed",
            ),
        };

        Self {
            registry: Arc::new(registry),
            registry_ops,
            dispatch,
            failover,
            announce,
        }
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_registered_metrics() {
        let metrics = MetricsRegistry::new();
        metrics.dispatch.requests_total.inc();
        metrics.failover.backup_active.set(1);

        let text = metrics.render();

        assert!(text.contains("hive_dispatch_requests_total 1"));
        assert!(text.contains("hive_backup_active 1"));
    }
}
