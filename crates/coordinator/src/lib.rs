//! Hive Coordinator
//!
//! Accepts worker registrations and dispatches inbound requests to registered
//! workers in round-robin order.

pub mod router;
pub mod server;

pub use router::DispatchRouter;
pub use server::{build_router, AppState};
