//! Typed event bus over one persistent WebSocket connection.
//!
//! Provides the dashboard's single source of truth for "is the process
//! connected":
//! - Named-event pub/sub with token-based unsubscription
//! - Connect/disconnect lifecycle hooks, deduplicated per transition
//! - Automatic reconnection with exponential backoff
//! - Heartbeat monitoring (ping/pong timeout detection)
//!
//! Delivery is best-effort and at-most-once per physical message: after a
//! drop, subscribers resynchronize through the connect hook instead of
//! relying on buffered events.

pub mod bus;
pub mod connection;
pub mod error;
pub mod heartbeat;

pub use bus::{EventBus, HandlerToken};
pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::{BusError, BusResult};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
