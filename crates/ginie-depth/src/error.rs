//! Error types for ginie-depth.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DepthError {
    #[error("Invalid bucket size: {0} (must be positive)")]
    InvalidBucketSize(Decimal),
}

pub type DepthResult<T> = Result<T, DepthError>;
