//! Event subscription registry and dispatch.
//!
//! Dozens of panels each care about a different subset of events; the bus
//! fans every inbound message out to the handlers registered for its name,
//! in subscription order. Handler faults are isolated: one panicking handler
//! never prevents the remaining handlers for the same event from running.

use ginie_core::{Event, EventType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Token identifying one registration, returned from `subscribe` and the
/// lifecycle hook registrations. Unsubscription goes through the token, not
/// closure identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerToken(u64);

type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;
type LifecycleHook = Arc<dyn Fn() + Send + Sync>;

/// Typed publish/subscribe channel over the push connection.
///
/// Explicitly constructed and injected (no module-level global) so tests can
/// run isolated instances side by side. All methods take `&self`; internal
/// state sits behind `parking_lot` locks.
pub struct EventBus {
    /// Per-event handler lists, insertion order preserved.
    handlers: RwLock<HashMap<EventType, Vec<(HandlerToken, EventHandler)>>>,
    /// Hooks fired when the connection transitions to connected.
    connect_hooks: RwLock<Vec<(HandlerToken, LifecycleHook)>>,
    /// Hooks fired when the connection transitions to disconnected.
    disconnect_hooks: RwLock<Vec<(HandlerToken, LifecycleHook)>>,
    /// Last observed connection state, for transition dedup.
    connected: RwLock<bool>,
    next_token: AtomicU64,
}

impl EventBus {
    /// Create a new, empty bus in the disconnected state.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            connect_hooks: RwLock::new(Vec::new()),
            disconnect_hooks: RwLock::new(Vec::new()),
            connected: RwLock::new(false),
            next_token: AtomicU64::new(1),
        }
    }

    fn issue_token(&self) -> HandlerToken {
        HandlerToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    /// Register `handler` for every event named `event_type`.
    ///
    /// Multiple handlers per name are allowed; dispatch runs them in
    /// subscription order. The same closure may be registered under several
    /// event names (each registration gets its own token).
    pub fn subscribe(
        &self,
        event_type: EventType,
        handler: impl Fn(&Event) + Send + Sync + 'static,
    ) -> HandlerToken {
        let token = self.issue_token();
        self.handlers
            .write()
            .entry(event_type)
            .or_default()
            .push((token, Arc::new(handler)));
        token
    }

    /// Remove one registration. No-op if the token is not registered under
    /// `event_type` (unsubscribing twice is fine).
    pub fn unsubscribe(&self, event_type: &EventType, token: HandlerToken) {
        let mut handlers = self.handlers.write();
        if let Some(list) = handlers.get_mut(event_type) {
            if let Some(pos) = list.iter().position(|(t, _)| *t == token) {
                list.remove(pos);
            }
            if list.is_empty() {
                handlers.remove(event_type);
            }
        }
    }

    /// Register a hook fired when the connection becomes connected.
    pub fn on_connect(&self, hook: impl Fn() + Send + Sync + 'static) -> HandlerToken {
        let token = self.issue_token();
        self.connect_hooks.write().push((token, Arc::new(hook)));
        token
    }

    /// Remove a connect hook. No-op if not registered.
    pub fn off_connect(&self, token: HandlerToken) {
        let mut hooks = self.connect_hooks.write();
        if let Some(pos) = hooks.iter().position(|(t, _)| *t == token) {
            hooks.remove(pos);
        }
    }

    /// Register a hook fired when the connection drops.
    pub fn on_disconnect(&self, hook: impl Fn() + Send + Sync + 'static) -> HandlerToken {
        let token = self.issue_token();
        self.disconnect_hooks.write().push((token, Arc::new(hook)));
        token
    }

    /// Remove a disconnect hook. No-op if not registered.
    pub fn off_disconnect(&self, token: HandlerToken) {
        let mut hooks = self.disconnect_hooks.write();
        if let Some(pos) = hooks.iter().position(|(t, _)| *t == token) {
            hooks.remove(pos);
        }
    }

    /// Deliver one event to its subscribers, in subscription order.
    ///
    /// At-most-once: there is no buffering or retry behind this call. A
    /// panicking handler is caught and logged, and iteration continues.
    pub fn dispatch(&self, event: &Event) {
        let handlers: Vec<EventHandler> = {
            let map = self.handlers.read();
            match map.get(&event.event_type) {
                Some(list) => list.iter().map(|(_, h)| h.clone()).collect(),
                None => return,
            }
        };

        debug!(event = %event.event_type, count = handlers.len(), "Dispatching event");

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(event = %event.event_type, "Event handler panicked, continuing dispatch");
            }
        }
    }

    /// Record a transition to connected and fire connect hooks.
    ///
    /// Repeated identical notifications are ignored; hooks fire exactly once
    /// per actual transition.
    pub fn emit_connected(&self) {
        {
            let mut connected = self.connected.write();
            if *connected {
                return;
            }
            *connected = true;
        }
        info!("Connection established, firing connect hooks");
        self.fire_hooks(&self.connect_hooks);
    }

    /// Record a transition to disconnected and fire disconnect hooks.
    ///
    /// Ignored while already disconnected (including at startup).
    pub fn emit_disconnected(&self) {
        {
            let mut connected = self.connected.write();
            if !*connected {
                return;
            }
            *connected = false;
        }
        info!("Connection lost, firing disconnect hooks");
        self.fire_hooks(&self.disconnect_hooks);
    }

    fn fire_hooks(&self, hooks: &RwLock<Vec<(HandlerToken, LifecycleHook)>>) {
        let snapshot: Vec<LifecycleHook> = hooks.read().iter().map(|(_, h)| h.clone()).collect();
        for hook in snapshot {
            if catch_unwind(AssertUnwindSafe(|| hook())).is_err() {
                error!("Lifecycle hook panicked, continuing");
            }
        }
    }

    /// Last observed connection state.
    pub fn is_connected(&self) -> bool {
        *self.connected.read()
    }

    /// Number of handlers currently registered for `event_type`.
    pub fn handler_count(&self, event_type: &EventType) -> usize {
        self.handlers
            .read()
            .get(event_type)
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Drop every registration and hook. Called on context shutdown.
    pub fn clear(&self) {
        self.handlers.write().clear();
        self.connect_hooks.write().clear();
        self.disconnect_hooks.write().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
