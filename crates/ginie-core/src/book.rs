//! Order book depth view types.
//!
//! `DepthRow` and `AggregatedBook` are the renderable output of the depth
//! aggregation in `ginie-depth`. They carry exact decimal values; depth-bar
//! normalization is a consumer concern fed by `max_cumulative`.

use crate::decimal::{Price, Qty};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "bid"),
            Self::Ask => write!(f, "ask"),
        }
    }
}

/// One aggregated depth row: a price bucket with its summed quantity and the
/// running total from the best price outward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthRow {
    /// Bucket boundary price.
    pub price: Price,
    /// Quantity summed over all raw levels in this bucket.
    pub qty: Qty,
    /// Running sum ordered from the best price outward.
    pub cumulative: Qty,
    pub side: Side,
}

impl DepthRow {
    /// Fraction of the deepest cumulative value, in `0..=1`.
    ///
    /// Feeds depth-bar widths. Returns zero when `max_cumulative` is zero.
    pub fn depth_ratio(&self, max_cumulative: Qty) -> Decimal {
        if max_cumulative.is_zero() {
            return Decimal::ZERO;
        }
        self.cumulative.inner() / max_cumulative.inner()
    }
}

/// The full aggregated view of one book generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedBook {
    /// Bid rows, best (highest) price first.
    pub bids: Vec<DepthRow>,
    /// Ask rows in display order: best (lowest) price last, nearest the spread.
    pub asks: Vec<DepthRow>,
    /// Maximum final cumulative quantity across both sides.
    pub max_cumulative: Qty,
    /// Book generation this view was computed from.
    pub seq: u64,
}

impl AggregatedBook {
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

impl Default for AggregatedBook {
    fn default() -> Self {
        Self {
            bids: Vec::new(),
            asks: Vec::new(),
            max_cumulative: Qty::ZERO,
            seq: 0,
        }
    }
}
