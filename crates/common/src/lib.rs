//! Hive common library
//!
//! Shared code used by the coordinator, worker and standby nodes.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod journal;
pub mod metrics;
pub mod net;
pub mod registry;

// Re-export commonly used types
pub use client::HiveClient;
pub use config::HiveConfig;
pub use error::{HiveError, Result};
pub use journal::EventLog;
pub use metrics::{MetricsRegistry, METRICS};
pub use registry::{Registration, Registry, RegistryHandle, WorkerRecord};
