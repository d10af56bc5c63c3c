//! Hive Standby
//!
//! Backup command node: keeps its own worker registry, archives records and
//! takes over dispatch while the coordinator is unreachable.

pub mod monitor;
pub mod server;

pub use monitor::{FailoverMonitor, FailoverState, MonitorConfig, Transition};
pub use server::{build_router, AppState};
