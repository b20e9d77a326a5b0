//! Error types for ginie-sync.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Bus error: {0}")]
    Bus(#[from] ginie_bus::BusError),
}

pub type SyncResult<T> = Result<T, SyncError>;
