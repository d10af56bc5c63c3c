//! Coordinator liveness monitor and failover state machine
//!
//! The standby probes the coordinator's health endpoint at a fixed interval.
//! `failure_threshold` consecutive failed probes move it from `Passive` to
//! `BackupActive`; the next successful probe moves it back. Transitions are
//! edge-triggered: the side effects fire once per transition, never once per
//! probe.

use hive_common::{EventLog, HiveClient, HiveConfig, METRICS};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Failover state of the standby
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverState {
    Passive,
    BackupActive,
}

/// State change caused by a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Passive -> BackupActive
    Promoted,

    /// BackupActive -> Passive
    Demoted,
}

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Coordinator base url
    pub coordinator_url: String,

    /// Delay between probes
    pub interval: Duration,

    /// Timeout for a single probe
    pub probe_timeout: Duration,

    /// Consecutive failures required for promotion
    pub failure_threshold: u32,
}

impl MonitorConfig {
    pub fn from_config(config: &HiveConfig) -> Self {
        Self {
            coordinator_url: config.coordinator_url(),
            interval: config.probe_interval(),
            probe_timeout: config.probe_timeout(),
            failure_threshold: config.failure_threshold,
        }
    }
}

#[derive(Debug)]
struct MonitorState {
    state: FailoverState,
    consecutive_failures: u32,
    transitions: u64,
}

/// Liveness monitor owning the standby's failover state
#[derive(Debug)]
pub struct FailoverMonitor {
    config: MonitorConfig,
    inner: RwLock<MonitorState>,
}

impl FailoverMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(MonitorState {
                state: FailoverState::Passive,
                consecutive_failures: 0,
                transitions: 0,
            }),
        }
    }

    pub fn state(&self) -> FailoverState {
        self.inner.read().state
    }

    pub fn is_backup_active(&self) -> bool {
        self.state() == FailoverState::BackupActive
    }

    /// Number of transitions since startup
    pub fn transitions(&self) -> u64 {
        self.inner.read().transitions
    }

    /// Feed one probe outcome and return the transition it caused, if any
    pub fn record_probe(&self, alive: bool) -> Option<Transition> {
        let mut inner = self.inner.write();

        if alive {
            inner.consecutive_failures = 0;
            if inner.state == FailoverState::BackupActive {
                inner.state = FailoverState::Passive;
                inner.transitions += 1;
                return Some(Transition::Demoted);
            }
            return None;
        }

        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        if inner.state == FailoverState::Passive
            && inner.consecutive_failures >= self.config.failure_threshold.max(1)
        {
            inner.state = FailoverState::BackupActive;
            inner.transitions += 1;
            return Some(Transition::Promoted);
        }
        None
    }

    /// Probe the coordinator once and apply the outcome
    pub async fn probe_once(&self, client: &HiveClient) -> Option<Transition> {
        METRICS.failover.probes_total.inc();

        let alive = match client
            .probe(&self.config.coordinator_url, self.config.probe_timeout)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                debug!("Coordinator probe failed: {}", e);
                METRICS.failover.probe_failures.inc();
                false
            }
        };

        self.record_probe(alive)
    }

    /// Probe forever, journaling every transition
    pub async fn run(self: Arc<Self>, client: HiveClient, journal: Arc<EventLog>) {
        info!(
            "Monitoring coordinator at {} every {:?}",
            self.config.coordinator_url, self.config.interval
        );

        loop {
            if let Some(transition) = self.probe_once(&client).await {
                METRICS.failover.transitions_total.inc();
                let message = match transition {
                    Transition::Promoted => {
                        METRICS.failover.backup_active.set(1);
                        warn!("Coordinator offline. Standby assuming backup command");
                        "coordinator unreachable, standby assuming backup command"
                    }
                    Transition::Demoted => {
                        METRICS.failover.backup_active.set(0);
                        info!("Coordinator reachable again. Standby returning to passive");
                        "coordinator reachable, standby returning to passive"
                    }
                };
                if let Err(e) = journal.append(message).await {
                    warn!("Failed to journal failover transition: {}", e);
                }
            }

            tokio::time::sleep(self.config.interval).await;
        }
    }

    /// Run in the background
    pub fn spawn(self: Arc<Self>, client: HiveClient, journal: Arc<EventLog>) -> JoinHandle<()> {
        tokio::spawn(self.run(client, journal))
    }
}
