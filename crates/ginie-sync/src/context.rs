//! The process-wide sync context.
//!
//! One `SyncContext` per process: it owns the bus, the connection task and
//! the fallback coordinator, and tears all three down on `shutdown`.

use crate::config::SyncConfig;
use ginie_bus::{ConnectionManager, EventBus};
use ginie_fallback::FallbackCoordinator;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Explicitly constructed, explicitly injected sync context.
///
/// Created at application start, shut down at application end. Panels reach
/// the bus and the coordinator through accessors; nothing here is a global,
/// so tests can run isolated contexts concurrently.
pub struct SyncContext {
    bus: Arc<EventBus>,
    connection: Arc<ConnectionManager>,
    fallback: FallbackCoordinator,
    connection_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncContext {
    /// Build the context and spawn the connection loop.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn create(config: SyncConfig) -> Self {
        ginie_bus::init_crypto();

        let bus = Arc::new(EventBus::new());
        let connection = Arc::new(ConnectionManager::new(config.connection, bus.clone()));
        let fallback = FallbackCoordinator::new(config.fallback, connection.state_watch());

        let conn = connection.clone();
        let connection_task = tokio::spawn(async move {
            if let Err(e) = conn.connect().await {
                error!(?e, "Connection loop ended with error");
            }
        });

        info!("Sync context created");
        Self {
            bus,
            connection,
            fallback,
            connection_task: Mutex::new(Some(connection_task)),
        }
    }

    /// The event bus panels subscribe on.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The connection manager (state accessor, outbound sends).
    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    /// The fallback coordinator panels register refresh functions with.
    pub fn fallback(&self) -> &FallbackCoordinator {
        &self.fallback
    }

    /// Stop the connection, the shared timer, and drop every registration.
    ///
    /// Idempotent; safe to call from multiple shutdown paths.
    pub async fn shutdown(&self) {
        self.connection.shutdown();

        let task = self.connection_task.lock().take();
        if let Some(task) = task {
            // Wait for the Close frame and loop exit.
            let _ = task.await;
        }

        self.fallback.shutdown();
        self.bus.clear();
        info!("Sync context shut down");
    }
}
