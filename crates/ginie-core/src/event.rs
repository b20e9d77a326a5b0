//! Named-event envelope pushed by the backend.
//!
//! The backend tags every push message with a SCREAMING_SNAKE event name and
//! an opaque JSON payload. Payload shapes are owned by the backend; this core
//! never looks inside `data` beyond routing on the event name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event names understood by the dashboard.
///
/// Unknown names deserialize into `Other` so that new backend events can be
/// subscribed to without a code change on this side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    SignalUpdate,
    SignalGenerated,
    GinieStatusUpdate,
    PositionUpdate,
    PnlUpdate,
    BalanceUpdate,
    ChainUpdate,
    LifecycleEvent,
    CircuitBreakerUpdate,
    ModeStatusUpdate,
    SystemStatusUpdate,
    PriceUpdate,
    TradeOpened,
    TradeClosed,
    OrderUpdate,
    BotStarted,
    BotStopped,
    /// Any event name not in the known taxonomy.
    Other(String),
}

impl EventType {
    /// The wire name of this event.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SignalUpdate => "SIGNAL_UPDATE",
            Self::SignalGenerated => "SIGNAL_GENERATED",
            Self::GinieStatusUpdate => "GINIE_STATUS_UPDATE",
            Self::PositionUpdate => "POSITION_UPDATE",
            Self::PnlUpdate => "PNL_UPDATE",
            Self::BalanceUpdate => "BALANCE_UPDATE",
            Self::ChainUpdate => "CHAIN_UPDATE",
            Self::LifecycleEvent => "LIFECYCLE_EVENT",
            Self::CircuitBreakerUpdate => "CIRCUIT_BREAKER_UPDATE",
            Self::ModeStatusUpdate => "MODE_STATUS_UPDATE",
            Self::SystemStatusUpdate => "SYSTEM_STATUS_UPDATE",
            Self::PriceUpdate => "PRICE_UPDATE",
            Self::TradeOpened => "TRADE_OPENED",
            Self::TradeClosed => "TRADE_CLOSED",
            Self::OrderUpdate => "ORDER_UPDATE",
            Self::BotStarted => "BOT_STARTED",
            Self::BotStopped => "BOT_STOPPED",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "SIGNAL_UPDATE" => Self::SignalUpdate,
            "SIGNAL_GENERATED" => Self::SignalGenerated,
            "GINIE_STATUS_UPDATE" => Self::GinieStatusUpdate,
            "POSITION_UPDATE" => Self::PositionUpdate,
            "PNL_UPDATE" => Self::PnlUpdate,
            "BALANCE_UPDATE" => Self::BalanceUpdate,
            "CHAIN_UPDATE" => Self::ChainUpdate,
            "LIFECYCLE_EVENT" => Self::LifecycleEvent,
            "CIRCUIT_BREAKER_UPDATE" => Self::CircuitBreakerUpdate,
            "MODE_STATUS_UPDATE" => Self::ModeStatusUpdate,
            "SYSTEM_STATUS_UPDATE" => Self::SystemStatusUpdate,
            "PRICE_UPDATE" => Self::PriceUpdate,
            "TRADE_OPENED" => Self::TradeOpened,
            "TRADE_CLOSED" => Self::TradeClosed,
            "ORDER_UPDATE" => Self::OrderUpdate,
            "BOT_STARTED" => Self::BotStarted,
            "BOT_STOPPED" => Self::BotStopped,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pushed event: name, timestamp, opaque payload.
///
/// Mirrors the backend envelope `{"type": ..., "timestamp": ..., "data": ...}`.
/// A missing timestamp defaults to receive time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Event {
    /// Create a new event stamped with the current time.
    pub fn new(event_type: EventType, data: serde_json::Value) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            data,
        }
    }
}
