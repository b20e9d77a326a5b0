//! Order book depth aggregation for the Ginie dashboard.
//!
//! Turns a raw two-sided price ladder into a depth-ranked, bucketed,
//! cumulative-volume-annotated view suitable for rendering:
//! - Bids round down, asks round up to deterministic bucket boundaries
//! - Same-bucket quantities are summed with exact decimal arithmetic
//! - Cumulative sums always run from the best price outward
//!
//! The aggregation is a pure function: the full raw book and the bucket size
//! go in on every call, a fresh result comes out. Bucket-size changes from
//! the UI therefore always produce a fully consistent recomputation.

pub mod aggregate;
pub mod error;
pub mod ladder;

pub use aggregate::{aggregate, is_standard_step, BUCKET_STEPS};
pub use error::{DepthError, DepthResult};
pub use ladder::{RawBook, RawLevel};
