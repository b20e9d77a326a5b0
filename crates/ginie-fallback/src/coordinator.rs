//! The process-wide fallback coordinator.
//!
//! Owns the keyed fetch registry and the single shared timer. The refresh
//! interval is per registration (panels observed in production poll at 5s,
//! 15s, 30s or 60s); the connected-safety policy is one shared
//! configuration.

use crate::error::FetchResult;
use futures_util::future::BoxFuture;
use ginie_bus::ConnectionState;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
// tokio's Instant, not std's: due times must follow the runtime clock.
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A boxed refresh future.
pub type FetchFuture = BoxFuture<'static, FetchResult>;

/// A registered zero-argument refresh function.
pub type FetchFn = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Coordinator configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CoordinatorConfig {
    /// Shared timer granularity. Per-key intervals are resolved against
    /// this tick, so they should be multiples of it.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// While the push channel is connected, each key's interval is
    /// multiplied by this factor (safety poll). `None` skips polling
    /// entirely while connected.
    #[serde(default = "default_connected_safety_factor")]
    pub connected_safety_factor: Option<u32>,
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_connected_safety_factor() -> Option<u32> {
    Some(6)
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            connected_safety_factor: default_connected_safety_factor(),
        }
    }
}

/// One registered consumer.
struct FetchEntry {
    fetch: FetchFn,
    interval: Duration,
    /// Set while a spawned fetch is pending; an overlapping tick for this
    /// key is skipped, never queued.
    in_flight: Arc<AtomicBool>,
    last_fired: Option<Instant>,
    registered_at: Instant,
}

struct TimerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    config: CoordinatorConfig,
    /// Keyed registry, iterated in registration order on each tick.
    registry: Mutex<IndexMap<String, FetchEntry>>,
    /// The one shared timer. `None` whenever the registry is empty.
    timer: Mutex<Option<TimerHandle>>,
    /// Push channel state; full-rate polling only while disconnected.
    conn_state: watch::Receiver<ConnectionState>,
    /// Keeps a standalone coordinator's state channel alive.
    _standalone_tx: Option<watch::Sender<ConnectionState>>,
}

/// Process-wide fallback scheduler.
///
/// Explicitly constructed and injected; clones share the same registry and
/// timer. Must be used from within a Tokio runtime (ticks and fetches run
/// as tasks).
#[derive(Clone)]
pub struct FallbackCoordinator {
    inner: Arc<Inner>,
}

impl FallbackCoordinator {
    /// Create a coordinator observing the given connection-state signal
    /// (obtained from `ConnectionManager::state_watch`).
    pub fn new(config: CoordinatorConfig, conn_state: watch::Receiver<ConnectionState>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                registry: Mutex::new(IndexMap::new()),
                timer: Mutex::new(None),
                conn_state,
                _standalone_tx: None,
            }),
        }
    }

    /// Create a coordinator with no push channel: every key polls at its
    /// own full rate. Used in tests and bus-less deployments.
    pub fn standalone(config: CoordinatorConfig) -> Self {
        let (tx, rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                config,
                registry: Mutex::new(IndexMap::new()),
                timer: Mutex::new(None),
                conn_state: rx,
                _standalone_tx: Some(tx),
            }),
        }
    }

    /// Store (or replace) the refresh function for `key`.
    ///
    /// Last writer wins: re-registering the same key before any unregister
    /// results in exactly one entry and resets its due time. The first
    /// registration overall starts the shared timer.
    pub fn register<F, Fut>(&self, key: impl Into<String>, interval: Duration, fetch: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let fetch: FetchFn = Arc::new(move || Box::pin(fetch()) as FetchFuture);
        self.register_boxed(key.into(), interval, fetch);
    }

    /// `register` for callers that already hold a boxed fetch function.
    pub fn register_boxed(&self, key: String, interval: Duration, fetch: FetchFn) {
        let entry = FetchEntry {
            fetch,
            interval,
            in_flight: Arc::new(AtomicBool::new(false)),
            last_fired: None,
            registered_at: Instant::now(),
        };

        {
            let mut registry = self.inner.registry.lock();
            if registry.insert(key.clone(), entry).is_some() {
                debug!(key = %key, "Replaced existing fallback registration");
            } else {
                debug!(key = %key, interval_ms = interval.as_millis() as u64, "Registered fallback fetch");
            }
        }

        self.ensure_timer();
    }

    /// Remove the entry for `key`. Idempotent. Stopping condition: when the
    /// registry becomes empty the shared timer is torn down — it is never
    /// left running with zero consumers.
    ///
    /// An in-flight fetch for this key is not cancelled; its late result is
    /// the consumer's to discard.
    pub fn unregister(&self, key: &str) {
        let now_empty = {
            let mut registry = self.inner.registry.lock();
            if registry.shift_remove(key).is_some() {
                debug!(key = %key, "Unregistered fallback fetch");
            }
            registry.is_empty()
        };

        if now_empty {
            self.stop_timer();
        }
    }

    /// Drop every registration and stop the timer.
    pub fn shutdown(&self) {
        self.inner.registry.lock().clear();
        self.stop_timer();
        info!("Fallback coordinator shut down");
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.inner.registry.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.lock().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.registry.lock().contains_key(key)
    }

    /// Whether the shared timer task currently exists.
    pub fn timer_running(&self) -> bool {
        self.inner.timer.lock().is_some()
    }

    /// Build a collision-free registration key for one mounted consumer
    /// instance.
    pub fn unique_key(name: &str) -> String {
        format!("{}-{}", name, Uuid::new_v4())
    }

    /// Start the shared timer if consumers exist and it is not running.
    fn ensure_timer(&self) {
        let mut slot = self.inner.timer.lock();
        if slot.is_some() || self.inner.registry.lock().is_empty() {
            return;
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task_inner = self.inner.clone();
        let tick = Duration::from_millis(self.inner.config.tick_ms);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => run_tick(&task_inner),
                    () = task_cancel.cancelled() => break,
                }
            }
        });

        info!(tick_ms = self.inner.config.tick_ms, "Fallback timer started");
        *slot = Some(TimerHandle { cancel, handle });
    }

    fn stop_timer(&self) {
        let mut slot = self.inner.timer.lock();
        if let Some(timer) = slot.take() {
            timer.cancel.cancel();
            timer.handle.abort();
            info!("Fallback timer stopped");
        }
    }
}

/// One firing of the shared timer.
///
/// Due entries are collected (and marked) under the registry lock in
/// registration order, then spawned outside it. Invocations run
/// independently; completion order is unconstrained.
fn run_tick(inner: &Arc<Inner>) {
    let connected = inner.conn_state.borrow().is_connected();
    let now = Instant::now();

    let due: Vec<(String, FetchFn, Arc<AtomicBool>)> = {
        let mut registry = inner.registry.lock();
        let mut due = Vec::new();

        for (key, entry) in registry.iter_mut() {
            let effective = match (connected, inner.config.connected_safety_factor) {
                (true, None) => continue,
                (true, Some(factor)) => entry.interval * factor,
                (false, _) => entry.interval,
            };

            let elapsed = now - entry.last_fired.unwrap_or(entry.registered_at);
            if elapsed < effective {
                continue;
            }

            if entry.in_flight.load(Ordering::SeqCst) {
                debug!(key = %key, "Previous fetch still pending, skipping tick");
                continue;
            }

            entry.in_flight.store(true, Ordering::SeqCst);
            entry.last_fired = Some(now);
            due.push((key.clone(), entry.fetch.clone(), entry.in_flight.clone()));
        }

        due
    };

    for (key, fetch, in_flight) in due {
        tokio::spawn(async move {
            if let Err(e) = fetch().await {
                // A failing consumer stays registered; the timer is unaffected.
                warn!(key = %key, error = %e, "Fallback fetch failed");
            }
            in_flight.store(false, Ordering::SeqCst);
        });
    }
}
