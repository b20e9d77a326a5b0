//! Core domain types for the Ginie dashboard sync layer.
//!
//! This crate provides fundamental types used throughout the sync core:
//! - `Price`, `Qty`: Precision-safe numeric types
//! - `EventType`, `Event`: The named-event envelope pushed by the backend
//! - `Side`, `DepthRow`, `AggregatedBook`: Order book depth view types

pub mod book;
pub mod decimal;
pub mod error;
pub mod event;

pub use book::{AggregatedBook, DepthRow, Side};
pub use decimal::{Price, Qty};
pub use error::{CoreError, Result};
pub use event::{Event, EventType};
