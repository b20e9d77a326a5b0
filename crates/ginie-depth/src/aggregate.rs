//! Pure depth aggregation.
//!
//! `aggregate` is re-entrant and keeps no state between calls: the consuming
//! panel owns both the raw book and the aggregated view. Malformed levels are
//! skipped per level so one corrupt feed entry cannot blank the entire book.

use crate::error::{DepthError, DepthResult};
use crate::ladder::{RawBook, RawLevel};
use ginie_core::{AggregatedBook, DepthRow, Price, Qty, Side};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tracing::warn;

/// The user-selectable bucket step sizes offered by the depth panel.
pub const BUCKET_STEPS: [Decimal; 7] = [
    dec!(0.01),
    dec!(0.1),
    dec!(0.5),
    dec!(1),
    dec!(10),
    dec!(50),
    dec!(100),
];

/// Whether `step` is one of the standard selectable steps.
pub fn is_standard_step(step: Decimal) -> bool {
    BUCKET_STEPS.iter().any(|s| *s == step)
}

/// Aggregate a raw ladder into bucketed, cumulative depth rows.
///
/// Bid buckets are `floor(px / bucket) * bucket`, ask buckets are
/// `ceil(px / bucket) * bucket`; quantities of raw levels mapping to the same
/// bucket are summed. Only the best `max_rows` buckets per side survive, and
/// cumulative sums run from the best price outward over the surviving rows.
///
/// Bid rows come back best-first (descending). Ask rows are accumulated
/// ascending from the best ask, then reversed so the best ask sits nearest
/// the spread in display order.
pub fn aggregate(
    book: &RawBook,
    bucket_size: Decimal,
    max_rows: usize,
) -> DepthResult<AggregatedBook> {
    if bucket_size.is_zero() || bucket_size.is_sign_negative() {
        return Err(DepthError::InvalidBucketSize(bucket_size));
    }

    let bid_buckets = bucket_side(&book.bids, bucket_size, Side::Bid);
    let ask_buckets = bucket_side(&book.asks, bucket_size, Side::Ask);

    // Bids: best price is the highest, so walk descending.
    let bids = accumulate(bid_buckets.iter().rev(), Side::Bid, max_rows);
    // Asks: best price is the lowest, so walk ascending for the cumulative
    // sums, and flip for display afterwards.
    let mut asks = accumulate(ask_buckets.iter(), Side::Ask, max_rows);

    let bid_total = bids.last().map(|row| row.cumulative).unwrap_or(Qty::ZERO);
    let ask_total = asks.last().map(|row| row.cumulative).unwrap_or(Qty::ZERO);
    let max_cumulative = bid_total.max(ask_total);

    asks.reverse();

    Ok(AggregatedBook {
        bids,
        asks,
        max_cumulative,
        seq: book.seq,
    })
}

/// Sum raw levels into price buckets for one side.
fn bucket_side(levels: &[RawLevel], bucket_size: Decimal, side: Side) -> BTreeMap<Decimal, Decimal> {
    let mut buckets = BTreeMap::new();

    for level in levels {
        let Some((px, sz)) = parse_level(level, side) else {
            continue;
        };

        let bucket = match side {
            Side::Bid => Price::new(px).bucket_floor(bucket_size),
            Side::Ask => Price::new(px).bucket_ceil(bucket_size),
        };

        *buckets.entry(bucket.inner()).or_insert(Decimal::ZERO) += sz;
    }

    buckets
}

/// Parse one raw level, skipping corrupt or degenerate entries.
fn parse_level(level: &RawLevel, side: Side) -> Option<(Decimal, Decimal)> {
    let px: Decimal = match level.px.parse() {
        Ok(px) => px,
        Err(e) => {
            warn!(px = %level.px, %side, error = %e, "Skipping level with malformed price");
            return None;
        }
    };
    let sz: Decimal = match level.sz.parse() {
        Ok(sz) => sz,
        Err(e) => {
            warn!(sz = %level.sz, %side, error = %e, "Skipping level with malformed quantity");
            return None;
        }
    };

    if px.is_zero() || px.is_sign_negative() || sz.is_zero() || sz.is_sign_negative() {
        warn!(%px, %sz, %side, "Skipping non-positive level");
        return None;
    }

    Some((px, sz))
}

/// Walk buckets in best-first order, keep the best `max_rows`, and annotate
/// each row with the running total.
fn accumulate<'a>(
    buckets: impl Iterator<Item = (&'a Decimal, &'a Decimal)>,
    side: Side,
    max_rows: usize,
) -> Vec<DepthRow> {
    let mut cumulative = Decimal::ZERO;
    let mut rows = Vec::with_capacity(max_rows);

    for (px, qty) in buckets.take(max_rows) {
        cumulative += qty;
        rows.push(DepthRow {
            price: Price::new(*px),
            qty: Qty::new(*qty),
            cumulative: Qty::new(cumulative),
            side,
        });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(price: Decimal, qty: Decimal, cumulative: Decimal, side: Side) -> DepthRow {
        DepthRow {
            price: Price::new(price),
            qty: Qty::new(qty),
            cumulative: Qty::new(cumulative),
            side,
        }
    }

    #[test]
    fn test_bid_bucketing_merges_and_orders() {
        // 100.03 and 100.07 land in the 100.0 bucket, 99.95 in 99.9.
        let book = RawBook::from_pairs(
            &[("100.03", "1"), ("100.07", "2"), ("99.95", "1")],
            &[],
            1,
        );
        let agg = aggregate(&book, dec!(0.1), 25).unwrap();

        assert_eq!(
            agg.bids,
            vec![
                row(dec!(100.0), dec!(3), dec!(3), Side::Bid),
                row(dec!(99.9), dec!(1), dec!(4), Side::Bid),
            ]
        );
        assert_eq!(agg.max_cumulative, Qty::new(dec!(4)));
    }

    #[test]
    fn test_ask_buckets_round_up_and_display_reversed() {
        let book = RawBook::from_pairs(&[], &[("100.01", "1"), ("100.14", "2"), ("100.22", "4")], 1);
        let agg = aggregate(&book, dec!(0.1), 25).unwrap();

        // Accumulation runs from the best ask (100.1) outward; display order
        // puts the best ask last, nearest the spread.
        assert_eq!(
            agg.asks,
            vec![
                row(dec!(100.3), dec!(4), dec!(7), Side::Ask),
                row(dec!(100.2), dec!(2), dec!(3), Side::Ask),
                row(dec!(100.1), dec!(1), dec!(1), Side::Ask),
            ]
        );
        assert_eq!(agg.max_cumulative, Qty::new(dec!(7)));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let book = RawBook::from_pairs(
            &[("100.03", "1.5"), ("99.95", "0.5")],
            &[("100.11", "2"), ("100.45", "1")],
            7,
        );
        let first = aggregate(&book, dec!(0.1), 10).unwrap();
        let second = aggregate(&book, dec!(0.1), 10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_book() {
        let agg = aggregate(&RawBook::default(), dec!(0.1), 25).unwrap();
        assert!(agg.is_empty());
        assert_eq!(agg.max_cumulative, Qty::ZERO);
    }

    #[test]
    fn test_single_sided_book() {
        let book = RawBook::from_pairs(&[], &[("100.1", "1"), ("100.2", "2")], 3);
        let agg = aggregate(&book, dec!(0.1), 25).unwrap();

        assert!(agg.bids.is_empty());
        assert_eq!(agg.asks.len(), 2);
        // max_cumulative equals the asks' final cumulative value.
        assert_eq!(agg.max_cumulative, Qty::new(dec!(3)));
    }

    #[test]
    fn test_malformed_levels_skipped() {
        let book = RawBook::from_pairs(
            &[("100.03", "1"), ("garbage", "2"), ("100.05", "abc"), ("-5", "1")],
            &[],
            1,
        );
        let agg = aggregate(&book, dec!(0.1), 25).unwrap();

        // Only the one clean level survives.
        assert_eq!(agg.bids, vec![row(dec!(100.0), dec!(1), dec!(1), Side::Bid)]);
    }

    #[test]
    fn test_zero_qty_levels_skipped() {
        let book = RawBook::from_pairs(&[("100.03", "0"), ("100.01", "2")], &[], 1);
        let agg = aggregate(&book, dec!(0.1), 25).unwrap();
        assert_eq!(agg.bids, vec![row(dec!(100.0), dec!(2), dec!(2), Side::Bid)]);
    }

    #[test]
    fn test_truncation_after_bucketing() {
        // Four raw levels collapse into two buckets; max_rows=1 keeps only
        // the best bucket, with its fully merged quantity.
        let book = RawBook::from_pairs(
            &[("100.09", "1"), ("100.01", "2"), ("99.99", "3"), ("99.91", "4")],
            &[],
            1,
        );
        let agg = aggregate(&book, dec!(0.1), 1).unwrap();

        assert_eq!(agg.bids, vec![row(dec!(100.0), dec!(3), dec!(3), Side::Bid)]);
    }

    #[test]
    fn test_max_rows_zero() {
        let book = RawBook::from_pairs(&[("100.0", "1")], &[("100.1", "1")], 1);
        let agg = aggregate(&book, dec!(0.1), 0).unwrap();
        assert!(agg.is_empty());
        assert_eq!(agg.max_cumulative, Qty::ZERO);
    }

    #[test]
    fn test_duplicate_prices_summed() {
        // Input is not deduplicated by price; duplicates merge in the bucket.
        let book = RawBook::from_pairs(&[("100.0", "1"), ("100.0", "2.5")], &[], 1);
        let agg = aggregate(&book, dec!(0.1), 25).unwrap();
        assert_eq!(agg.bids, vec![row(dec!(100.0), dec!(3.5), dec!(3.5), Side::Bid)]);
    }

    #[test]
    fn test_invalid_bucket_size_rejected() {
        let book = RawBook::default();
        assert!(matches!(
            aggregate(&book, dec!(0), 25),
            Err(DepthError::InvalidBucketSize(_))
        ));
        assert!(matches!(
            aggregate(&book, dec!(-0.1), 25),
            Err(DepthError::InvalidBucketSize(_))
        ));
    }

    #[test]
    fn test_seq_carried_through() {
        let book = RawBook::from_pairs(&[("100.0", "1")], &[], 99);
        let agg = aggregate(&book, dec!(1), 25).unwrap();
        assert_eq!(agg.seq, 99);
    }

    #[test]
    fn test_standard_steps() {
        assert!(is_standard_step(dec!(0.1)));
        assert!(!is_standard_step(dec!(0.25)));
    }

    #[test]
    fn test_exact_decimal_sums() {
        // 0.1 + 0.2 must be exactly 0.3, not a float approximation.
        let book = RawBook::from_pairs(&[("100.01", "0.1"), ("100.02", "0.2")], &[], 1);
        let agg = aggregate(&book, dec!(0.1), 25).unwrap();
        assert_eq!(agg.bids[0].qty, Qty::new(dec!(0.3)));
    }
}
