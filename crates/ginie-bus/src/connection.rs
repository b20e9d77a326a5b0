//! WebSocket connection manager.
//!
//! Owns the one persistent socket behind the bus: connection lifecycle,
//! automatic reconnection with exponential backoff, heartbeat, and the
//! fan-out of inbound frames to `EventBus::dispatch`.

use crate::bus::EventBus;
use crate::error::{BusError, BusResult};
use crate::heartbeat::HeartbeatManager;
use futures_util::{SinkExt, StreamExt};
use ginie_core::Event;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex as TokioMutex};
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// WebSocket URL of the backend push endpoint.
    pub url: String,
    /// Maximum reconnection attempts (0 = infinite).
    #[serde(default)]
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Maximum delay for exponential backoff.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Heartbeat interval.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Heartbeat timeout (pong must arrive within this).
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    /// Access token, appended as a `token` query parameter.
    /// The backend's user socket validates it during the upgrade.
    #[serde(default)]
    pub auth_token: Option<String>,
}

fn default_reconnect_base_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    60000
}

fn default_heartbeat_interval_ms() -> u64 {
    30000
}

fn default_heartbeat_timeout_ms() -> u64 {
    10000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 0, // Infinite
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            auth_token: None,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    /// Whether the push channel is currently usable.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// WebSocket connection manager.
pub struct ConnectionManager {
    config: ConnectionConfig,
    bus: Arc<EventBus>,
    state: Arc<RwLock<ConnectionState>>,
    /// Broadcasts state changes to observers (the fallback coordinator).
    state_tx: watch::Sender<ConnectionState>,
    heartbeat: HeartbeatManager,
    /// Outbound message sender (cloned into `send_json`).
    outbound_tx: mpsc::Sender<serde_json::Value>,
    /// Outbound message receiver (consumed by the message loop).
    outbound_rx: Arc<TokioMutex<mpsc::Receiver<serde_json::Value>>>,
    /// Cancellation token for graceful shutdown.
    shutdown_token: CancellationToken,
}

impl ConnectionManager {
    /// Create a new connection manager dispatching into `bus`.
    pub fn new(config: ConnectionConfig, bus: Arc<EventBus>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(100);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let heartbeat = HeartbeatManager::new(
            config.heartbeat_interval_ms,
            config.heartbeat_timeout_ms,
        );
        Self {
            config,
            bus,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            state_tx,
            heartbeat,
            outbound_tx,
            outbound_rx: Arc::new(TokioMutex::new(outbound_rx)),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Subscribe to connection state changes.
    ///
    /// This is the signal the fallback coordinator observes to decide
    /// between full-rate and safety polling.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.write() = next;
        let _ = self.state_tx.send_replace(next);
    }

    /// Queue a JSON message for the server.
    ///
    /// The message is written by the connection loop; if the process is
    /// between connections it stays queued until reconnect or shutdown.
    pub async fn send_json(&self, value: serde_json::Value) -> BusResult<()> {
        self.outbound_tx
            .send(value)
            .await
            .map_err(|e| BusError::SendFailed(e.to_string()))
    }

    /// Signal graceful shutdown. The message loop sends a Close frame and
    /// the retry loop exits without reconnecting.
    pub fn shutdown(&self) {
        info!("ConnectionManager shutdown requested");
        self.shutdown_token.cancel();
    }

    /// Check if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Connect and run the message loop, reconnecting on failure.
    pub async fn connect(&self) -> BusResult<()> {
        let mut attempt = 0u32;

        loop {
            if self.is_shutdown() {
                info!("Shutdown requested, exiting connect loop");
                self.set_state(ConnectionState::Disconnected);
                return Ok(());
            }

            self.set_state(ConnectionState::Connecting);

            match self.try_connect().await {
                Ok(()) => {
                    info!("WebSocket connection closed");
                    attempt = 0;
                }
                Err(e) => {
                    error!(?e, "WebSocket connection error");
                }
            }

            // Leaving the connected state in any way means subscribers must
            // resynchronize; the bus dedupes if we never got that far.
            self.bus.emit_disconnected();

            if self.is_shutdown() {
                info!("Shutdown requested after disconnect, not reconnecting");
                self.set_state(ConnectionState::Disconnected);
                return Ok(());
            }

            attempt += 1;
            if self.config.max_reconnect_attempts > 0
                && attempt >= self.config.max_reconnect_attempts
            {
                error!(attempt, "Max reconnection attempts reached");
                self.set_state(ConnectionState::Disconnected);
                return Err(BusError::ConnectionFailed(
                    "Max reconnection attempts reached".to_string(),
                ));
            }

            self.set_state(ConnectionState::Reconnecting);

            let delay = self.calculate_backoff_delay(attempt);
            warn!(attempt, delay_ms = delay.as_millis(), "Reconnecting");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during backoff, exiting");
                    self.set_state(ConnectionState::Disconnected);
                    return Ok(());
                }
            }
        }
    }

    async fn try_connect(&self) -> BusResult<()> {
        let url = build_connect_url(&self.config.url, self.config.auth_token.as_deref());
        info!(url = %self.config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async_tls_with_config(&url, None, true, None).await?;
        let (mut write, mut read) = ws_stream.split();

        self.set_state(ConnectionState::Connected);
        info!("WebSocket connected");
        self.heartbeat.reset();
        self.bus.emit_connected();

        loop {
            let outbound_recv = async { self.outbound_rx.lock().await.recv().await };

            tokio::select! {
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received in message loop");
                    if let Err(e) = write.send(Message::Close(None)).await {
                        warn!(?e, "Failed to send Close frame during shutdown");
                    }
                    self.set_state(ConnectionState::Disconnected);
                    return Ok(());
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_text_frame(&text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            self.heartbeat.record_pong();
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            warn!(code, %reason, "WebSocket closed by server");
                            return Err(BusError::ConnectionClosed { code, reason });
                        }
                        Some(Err(e)) => {
                            error!(?e, "WebSocket read error");
                            return Err(e.into());
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Ok(());
                        }
                        _ => {}
                    }
                }

                outbound = outbound_recv => {
                    if let Some(value) = outbound {
                        write.send(Message::Text(value.to_string())).await?;
                    }
                }

                _ = self.heartbeat.wait_for_check() => {
                    if self.heartbeat.is_timed_out() {
                        error!("Heartbeat timeout");
                        return Err(BusError::HeartbeatTimeout);
                    }
                    if self.heartbeat.should_send_ping() {
                        write.send(Message::Ping(Vec::new())).await?;
                        self.heartbeat.record_ping();
                        debug!("Sent heartbeat ping");
                    }
                }
            }
        }
    }

    /// Parse one inbound frame and fan it out.
    ///
    /// Malformed frames are dropped: a corrupt push message must never tear
    /// down the connection or surface as a subscriber-visible fault.
    fn handle_text_frame(&self, text: &str) {
        self.heartbeat.record_message();

        match serde_json::from_str::<Event>(text) {
            Ok(event) => self.bus.dispatch(&event),
            Err(e) => {
                warn!(error = %e, "Dropping malformed push frame");
            }
        }
    }

    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.reconnect_base_delay_ms;
        let max = self.config.reconnect_max_delay_ms;

        // Exponential backoff: base * 2^(attempt-1), capped at max.
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = base.saturating_mul(1u64 << exponent);
        let delay = delay.min(max);

        // Add jitter (0-1000ms) so reconnecting clients spread out.
        Duration::from_millis(delay + rand_jitter())
    }
}

/// Generate random jitter (0-1000ms).
fn rand_jitter() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as u64
}

/// Append the access token as a query parameter, if configured.
///
/// Extracted as a separate function for testability.
fn build_connect_url(url: &str, auth_token: Option<&str>) -> String {
    match auth_token {
        Some(token) => {
            let sep = if url.contains('?') { '&' } else { '?' };
            format!("{url}{sep}token={token}")
        }
        None => url.to_string(),
    }
}
