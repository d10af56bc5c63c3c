//! Worker self-registration
//!
//! The worker announces itself to every command node (coordinator, then
//! standby). Each target is tried independently. Targets that did not
//! acknowledge are retried with exponential backoff for a bounded number of
//! rounds; afterwards the worker re-announces to all targets on a fixed
//! interval so that a promoted standby eventually learns the full worker set.
//! Announcing never blocks the worker's own endpoint.

use hive_common::error::HiveError;
use hive_common::{HiveClient, HiveConfig, METRICS};
use hive_proto::RegisterRequest;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Announce tuning
#[derive(Debug, Clone)]
pub struct AnnounceConfig {
    /// Command node base urls, in announce order
    pub targets: Vec<String>,

    /// Timeout for one registration call
    pub request_timeout: Duration,

    /// Delay before the first retry round
    pub initial_backoff: Duration,

    /// Upper bound for the retry delay
    pub max_backoff: Duration,

    /// Rounds before the initial announce gives up
    pub max_attempts: u32,

    /// Periodic re-announce, `None` to announce at startup only
    pub reannounce_interval: Option<Duration>,
}

impl AnnounceConfig {
    pub fn from_config(config: &HiveConfig) -> Self {
        Self {
            targets: config.command_targets(),
            request_timeout: config.registration_timeout(),
            initial_backoff: config.announce_initial_backoff(),
            max_backoff: config.announce_max_backoff(),
            max_attempts: config.announce_max_attempts,
            reannounce_interval: config.reannounce_interval(),
        }
    }
}

/// Result of one or more announce rounds
#[derive(Debug, Default)]
pub struct AnnounceReport {
    /// Targets that acknowledged
    pub accepted: Vec<String>,

    /// Targets that did not, with the last error seen
    pub failed: Vec<(String, HiveError)>,
}

impl AnnounceReport {
    pub fn all_accepted(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Announces one worker to its command nodes
pub struct Announcer {
    client: HiveClient,
    registration: RegisterRequest,
    config: AnnounceConfig,
}

impl Announcer {
    pub fn new(client: HiveClient, registration: RegisterRequest, config: AnnounceConfig) -> Self {
        Self {
            client,
            registration,
            config,
        }
    }

    /// One registration call per target, in order
    pub async fn announce_once(&self, targets: &[String]) -> AnnounceReport {
        let mut report = AnnounceReport::default();

        for target in targets {
            match self
                .client
                .register(target, &self.registration, self.config.request_timeout)
                .await
            {
                Ok(ack) => {
                    info!("Signal sent to command node {} ({})", target, ack.status);
                    METRICS.announce.accepted_total.inc();
                    report.accepted.push(target.clone());
                }
                Err(e) => {
                    warn!("Connection failed to {}: {}", target, e);
                    METRICS.announce.failures_total.inc();
                    report.failed.push((target.clone(), e));
                }
            }
        }

        report
    }

    /// Announce to all targets, retrying unacknowledged ones with backoff
    pub async fn announce_with_backoff(&self) -> AnnounceReport {
        let rounds = self.config.max_attempts.max(1);
        let mut pending = self.config.targets.clone();
        let mut accepted = Vec::new();
        let mut failed = Vec::new();
        let mut delay = self.config.initial_backoff;

        for round in 1..=rounds {
            let report = self.announce_once(&pending).await;
            accepted.extend(report.accepted);
            failed = report.failed;

            if failed.is_empty() || round == rounds {
                break;
            }

            pending = failed.iter().map(|(target, _)| target.clone()).collect();
            debug!(
                "Announce round {}/{} left {} target(s) pending, retrying in {:?}",
                round,
                rounds,
                pending.len(),
                delay
            );
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2).min(self.config.max_backoff);
        }

        AnnounceReport { accepted, failed }
    }

    /// Initial announce followed by periodic re-announce
    pub async fn run(self) {
        let report = self.announce_with_backoff().await;
        if report.all_accepted() {
            info!("Registered with {} command node(s)", report.accepted.len());
        } else {
            warn!(
                "{} command node(s) did not acknowledge; will retry on re-announce",
                report.failed.len()
            );
        }

        let Some(interval) = self.config.reannounce_interval else {
            return;
        };

        loop {
            tokio::time::sleep(interval).await;
            let report = self.announce_once(&self.config.targets).await;
            debug!(
                "Re-announce: {} accepted, {} failed",
                report.accepted.len(),
                report.failed.len()
            );
        }
    }

    /// Run in the background
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_targets_coordinator_then_standby() {
        let config = HiveConfig::generate("10.0.0.1", "10.0.0.9", "");

        let announce = AnnounceConfig::from_config(&config);

        assert_eq!(announce.targets, vec!["http://10.0.0.1:8000", "http://10.0.0.9:9000"]);
        assert_eq!(announce.request_timeout, Duration::from_secs(2));
        assert_eq!(announce.reannounce_interval, Some(Duration::from_secs(30)));
    }
}
