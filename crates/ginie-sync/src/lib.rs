//! Process-wide sync context for the Ginie dashboard.
//!
//! Wires the event bus, the WebSocket connection and the fallback
//! coordinator into one explicitly constructed object with a defined
//! lifecycle: `SyncContext::create` at application start, `shutdown` at
//! application end. No module-level globals — tests construct isolated
//! instances side by side.

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod rest;

pub use config::SyncConfig;
pub use context::SyncContext;
pub use error::{SyncError, SyncResult};
pub use rest::{RestClient, RestConfig};
