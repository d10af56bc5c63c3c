//! Configuration for Hive nodes
//!
//! A single flat JSON file is produced once by the fabricator and read once at
//! node startup. Any key can be overridden by a `HIVE_<KEY>` environment
//! variable. The loaded value is immutable and passed explicitly to every
//! component that needs it.

use crate::error::{HiveError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file name, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "hive_config.json";

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "HIVE_CONFIG";

const ENV_PREFIX: &str = "HIVE";

/// Flat configuration shared by all node roles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiveConfig {
    /// Coordinator host
    pub coordinator_addr: String,

    /// Coordinator HTTP port
    #[serde(default = "default_coordinator_port")]
    pub coordinator_port: u16,

    /// Standby host
    pub standby_addr: String,

    /// Standby HTTP port
    #[serde(default = "default_standby_port")]
    pub standby_port: u16,

    /// Generated worker identifier
    pub worker_id: String,

    /// Worker HTTP port
    #[serde(default = "default_worker_port")]
    pub worker_port: u16,

    /// Address the worker advertises in its callback url (local IP if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_advertise_addr: Option<String>,

    /// Interface every node binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Vendor label
    #[serde(default)]
    pub vendor: String,

    /// When the configuration was generated
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Timeout for a forwarded dispatch
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_secs: u64,

    /// Timeout for a single registration call
    #[serde(default = "default_registration_timeout")]
    pub registration_timeout_secs: u64,

    /// Delay between liveness probes
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    /// Timeout for a single liveness probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Consecutive failed probes before the standby takes command
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// First announce retry delay
    #[serde(default = "default_announce_initial_backoff")]
    pub announce_initial_backoff_ms: u64,

    /// Upper bound for the announce retry delay
    #[serde(default = "default_announce_max_backoff")]
    pub announce_max_backoff_secs: u64,

    /// Announce rounds before giving up until the next re-announce
    #[serde(default = "default_announce_max_attempts")]
    pub announce_max_attempts: u32,

    /// Periodic re-announce interval (0 = announce at startup only)
    #[serde(default = "default_reannounce_interval")]
    pub reannounce_interval_secs: u64,

    /// Registry seed file loaded as the initial registry
    #[serde(default = "default_registry_seed_path")]
    pub registry_seed_path: PathBuf,

    /// Append-only log of worker arrivals and system events
    #[serde(default = "default_event_log_path")]
    pub event_log_path: PathBuf,

    /// Standby archive log
    #[serde(default = "default_archive_log_path")]
    pub archive_log_path: PathBuf,
}

fn default_coordinator_port() -> u16 {
    8000
}

fn default_standby_port() -> u16 {
    9000
}

fn default_worker_port() -> u16 {
    8081
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_dispatch_timeout() -> u64 {
    60
}

fn default_registration_timeout() -> u64 {
    2
}

fn default_probe_interval() -> u64 {
    2
}

fn default_probe_timeout() -> u64 {
    1
}

fn default_failure_threshold() -> u32 {
    1 // single-probe edge trigger
}

fn default_announce_initial_backoff() -> u64 {
    500
}

fn default_announce_max_backoff() -> u64 {
    30
}

fn default_announce_max_attempts() -> u32 {
    5
}

fn default_reannounce_interval() -> u64 {
    30
}

fn default_registry_seed_path() -> PathBuf {
    PathBuf::from("hive_registry.json")
}

fn default_event_log_path() -> PathBuf {
    PathBuf::from("hive_events.log")
}

fn default_archive_log_path() -> PathBuf {
    PathBuf::from("hive_archive.log")
}

impl HiveConfig {
    /// Fresh configuration with generated identity and default tuning
    pub fn generate(
        coordinator_addr: impl Into<String>,
        standby_addr: impl Into<String>,
        vendor: impl Into<String>,
    ) -> Self {
        Self {
            coordinator_addr: coordinator_addr.into(),
            coordinator_port: default_coordinator_port(),
            standby_addr: standby_addr.into(),
            standby_port: default_standby_port(),
            worker_id: format!("worker-{}", uuid::Uuid::new_v4().simple()),
            worker_port: default_worker_port(),
            worker_advertise_addr: None,
            bind_address: default_bind_address(),
            vendor: vendor.into(),
            created_at: Utc::now(),
            dispatch_timeout_secs: default_dispatch_timeout(),
            registration_timeout_secs: default_registration_timeout(),
            probe_interval_secs: default_probe_interval(),
            probe_timeout_secs: default_probe_timeout(),
            failure_threshold: default_failure_threshold(),
            announce_initial_backoff_ms: default_announce_initial_backoff(),
            announce_max_backoff_secs: default_announce_max_backoff(),
            announce_max_attempts: default_announce_max_attempts(),
            reannounce_interval_secs: default_reannounce_interval(),
            registry_seed_path: default_registry_seed_path(),
            event_log_path: default_event_log_path(),
            archive_log_path: default_archive_log_path(),
        }
    }

    /// Path named by `HIVE_CONFIG`, or the default file name
    pub fn resolve_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load the configuration file with `HIVE_*` environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(path.as_ref(), true)
    }

    /// Load the configuration file alone
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(path.as_ref(), false)
    }

    fn build(path: &Path, with_env: bool) -> Result<Self> {
        if !path.is_file() {
            return Err(HiveError::ConfigurationMissing {
                path: path.to_path_buf(),
            });
        }

        let mut builder = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Json));
        if with_env {
            builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        }

        let config: HiveConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| {
                HiveError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.coordinator_addr.trim().is_empty() {
            return Err(HiveError::config("coordinator_addr must not be empty"));
        }
        if self.standby_addr.trim().is_empty() {
            return Err(HiveError::config("standby_addr must not be empty"));
        }
        if self.worker_id.trim().is_empty() {
            return Err(HiveError::config("worker_id must not be empty"));
        }
        for (name, port) in [
            ("coordinator_port", self.coordinator_port),
            ("standby_port", self.standby_port),
            ("worker_port", self.worker_port),
        ] {
            if port == 0 {
                return Err(HiveError::config(format!("{} must be non-zero", name)));
            }
        }
        if self.failure_threshold == 0 {
            return Err(HiveError::config("failure_threshold must be at least 1"));
        }
        if self.probe_interval_secs == 0 || self.probe_timeout_secs == 0 {
            return Err(HiveError::config("probe interval and timeout must be non-zero"));
        }
        Ok(())
    }

    /// Base url of the coordinator
    pub fn coordinator_url(&self) -> String {
        format!("http://{}:{}", self.coordinator_addr, self.coordinator_port)
    }

    /// Base url of the standby
    pub fn standby_url(&self) -> String {
        format!("http://{}:{}", self.standby_addr, self.standby_port)
    }

    /// Command nodes a worker announces itself to, in order
    pub fn command_targets(&self) -> Vec<String> {
        vec![self.coordinator_url(), self.standby_url()]
    }

    /// Callback url a worker advertises for the given host
    pub fn worker_url(&self, host: &str) -> String {
        format!("http://{}:{}", host, self.worker_port)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn registration_timeout(&self) -> Duration {
        Duration::from_secs(self.registration_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn announce_initial_backoff(&self) -> Duration {
        Duration::from_millis(self.announce_initial_backoff_ms)
    }

    pub fn announce_max_backoff(&self) -> Duration {
        Duration::from_secs(self.announce_max_backoff_secs)
    }

    /// `None` when periodic re-announce is disabled
    pub fn reannounce_interval(&self) -> Option<Duration> {
        (self.reannounce_interval_secs > 0).then(|| Duration::from_secs(self.reannounce_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_generated_config_validates() {
        let config = HiveConfig::generate("10.0.0.1", "10.0.0.9", "acme");

        assert!(config.validate().is_ok());
        assert!(config.worker_id.starts_with("worker-"));
        assert_eq!(config.coordinator_url(), "http://10.0.0.1:8000");
        assert_eq!(
            config.command_targets(),
            vec!["http://10.0.0.1:8000".to_string(), "http://10.0.0.9:9000".to_string()]
        );
    }

    #[test]
    fn test_config_validation_rejects_zero_threshold() {
        let mut config = HiveConfig::generate("10.0.0.1", "10.0.0.9", "");
        config.failure_threshold = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_configuration_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = HiveConfig::from_file(dir.path().join("absent.json")).unwrap_err();

        assert!(matches!(err, HiveError::ConfigurationMissing { .. }));
    }

    #[test]
    fn test_minimal_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"coordinator_addr": "10.0.0.1", "standby_addr": "10.0.0.9", "worker_id": "worker-a"}}"#
        )
        .unwrap();

        let config = HiveConfig::from_file(file.path()).unwrap();

        assert_eq!(config.coordinator_port, 8000);
        assert_eq!(config.standby_port, 9000);
        assert_eq!(config.dispatch_timeout(), Duration::from_secs(60));
        assert_eq!(config.probe_interval(), Duration::from_secs(2));
        assert_eq!(config.probe_timeout(), Duration::from_secs(1));
        assert_eq!(config.failure_threshold, 1);
        assert_eq!(config.reannounce_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_save_then_load_keeps_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hive_config.json");
        let config = HiveConfig::generate("10.0.0.1", "10.0.0.9", "acme");

        config.save(&path).unwrap();
        let loaded = HiveConfig::from_file(&path).unwrap();

        assert_eq!(loaded.worker_id, config.worker_id);
        assert_eq!(loaded.vendor, "acme");
        assert_eq!(loaded.created_at, config.created_at);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = HiveConfig::from_file(file.path()).unwrap_err();

        assert!(matches!(err, HiveError::Config(_)));
    }
}
