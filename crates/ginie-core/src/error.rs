//! Error types for ginie-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid quantity: {0}")]
    InvalidQty(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Invalid event payload: {0}")]
    InvalidEvent(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
