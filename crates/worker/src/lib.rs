//! Hive Worker
//!
//! Announces itself to the command nodes and serves requests forwarded to it.

pub mod announce;
pub mod server;

pub use announce::{AnnounceConfig, AnnounceReport, Announcer};
pub use server::{build_router, AppState};
