//! Raw ladder wire types.
//!
//! The venue feed delivers prices and quantities as strings. They stay
//! strings until aggregation so no precision is lost in transit; parsing
//! happens per level and tolerates corrupt entries.

use serde::{Deserialize, Serialize};

/// One raw price level as received from the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLevel {
    /// Price string, venue precision.
    pub px: String,
    /// Quantity string, venue precision.
    pub sz: String,
}

impl RawLevel {
    pub fn new(px: impl Into<String>, sz: impl Into<String>) -> Self {
        Self {
            px: px.into(),
            sz: sz.into(),
        }
    }
}

/// A raw two-sided ladder plus its book generation.
///
/// Bids arrive descending and asks ascending by price, but neither ordering
/// nor per-price deduplication is required on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawBook {
    #[serde(default)]
    pub bids: Vec<RawLevel>,
    #[serde(default)]
    pub asks: Vec<RawLevel>,
    /// Book generation sequence from the feed.
    #[serde(default)]
    pub seq: u64,
}

impl RawBook {
    pub fn new(bids: Vec<RawLevel>, asks: Vec<RawLevel>, seq: u64) -> Self {
        Self { bids, asks, seq }
    }

    /// Build a book from `(px, sz)` string pairs. Test and demo convenience.
    pub fn from_pairs(bids: &[(&str, &str)], asks: &[(&str, &str)], seq: u64) -> Self {
        Self {
            bids: bids.iter().map(|(p, s)| RawLevel::new(*p, *s)).collect(),
            asks: asks.iter().map(|(p, s)| RawLevel::new(*p, *s)).collect(),
            seq,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_book_deserialize() {
        let raw = json!({
            "bids": [{"px": "100.03", "sz": "1"}],
            "asks": [{"px": "100.11", "sz": "2"}],
            "seq": 42
        });
        let book: RawBook = serde_json::from_value(raw).unwrap();
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.asks[0].px, "100.11");
        assert_eq!(book.seq, 42);
    }

    #[test]
    fn test_raw_book_missing_sides_default_empty() {
        let book: RawBook = serde_json::from_value(json!({"seq": 1})).unwrap();
        assert!(book.is_empty());
    }
}
