//! Mock push server for integration tests.
//!
//! Provides a simple WebSocket server that can:
//! - Accept connections
//! - Record received messages
//! - Broadcast event frames to all connected clients
//! - Drop every connection on shutdown

use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

/// A mock push server for testing.
pub struct MockPushServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    broadcast_tx: broadcast::Sender<String>,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
}

impl MockPushServer {
    /// Start a new mock server on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let messages: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
        let connections: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let (broadcast_tx, _) = broadcast::channel::<String>(64);
        let shutdown = CancellationToken::new();

        let messages_clone = messages.clone();
        let connections_clone = connections.clone();
        let broadcast_clone = broadcast_tx.clone();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        let messages = messages_clone.clone();
                        let connections = connections_clone.clone();
                        let broadcast_rx = broadcast_clone.subscribe();
                        let shutdown = shutdown_clone.clone();
                        tokio::spawn(handle_connection(
                            stream, messages, connections, broadcast_rx, shutdown,
                        ));
                    }
                    () = shutdown_clone.cancelled() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            broadcast_tx,
            messages,
            connections,
        }
    }

    /// Get the server's WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Get the number of connections received.
    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// Get all received messages.
    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.iter().cloned().collect()
    }

    /// Push a text frame to every connected client.
    pub fn broadcast(&self, text: impl Into<String>) {
        let _ = self.broadcast_tx.send(text.into());
    }

    /// Shut down the server, dropping all active connections.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

async fn handle_connection(
    stream: TcpStream,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
    mut broadcast_rx: broadcast::Receiver<String>,
    shutdown: CancellationToken,
) {
    {
        let mut count = connections.lock().await;
        *count += 1;
    }

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                // Drop the stream so clients observe a disconnect.
                break;
            }
            Ok(text) = broadcast_rx.recv() => {
                if write.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let mut msgs = messages.lock().await;
                        msgs.push_back(text);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
}
