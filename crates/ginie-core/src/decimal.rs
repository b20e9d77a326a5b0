//! Precision-safe decimal types for market data.
//!
//! Uses `rust_decimal` for exact decimal arithmetic, avoiding
//! floating-point rounding errors in bucket boundaries and
//! cumulative volume sums.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// prices with quantities in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round down to the nearest bucket boundary (bid side).
    ///
    /// Returns the price unchanged if `step` is zero or negative;
    /// callers validate the step upstream.
    #[inline]
    pub fn bucket_floor(&self, step: Decimal) -> Self {
        if step.is_zero() || step.is_sign_negative() {
            return *self;
        }
        Self((self.0 / step).floor() * step)
    }

    /// Round up to the nearest bucket boundary (ask side).
    ///
    /// Returns the price unchanged if `step` is zero or negative;
    /// callers validate the step upstream.
    #[inline]
    pub fn bucket_ceil(&self, step: Decimal) -> Self {
        if step.is_zero() || step.is_sign_negative() {
            return *self;
        }
        Self((self.0 / step).ceil() * step)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Price {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Quantity with exact decimal precision.
///
/// Wraps `Decimal` to provide type safety and prevent mixing
/// quantities with prices in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qty(pub Decimal);

impl Qty {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Calculate notional value: qty * price.
    #[inline]
    pub fn notional(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Qty {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Qty {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Qty {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Qty {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Qty {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<Decimal> for Qty {
    type Output = Self;

    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bucket_floor() {
        let price = Price::new(dec!(100.07));
        assert_eq!(price.bucket_floor(dec!(0.1)).inner(), dec!(100.0));

        let price = Price::new(dec!(99.95));
        assert_eq!(price.bucket_floor(dec!(0.1)).inner(), dec!(99.9));
    }

    #[test]
    fn test_bucket_ceil() {
        let price = Price::new(dec!(100.03));
        assert_eq!(price.bucket_ceil(dec!(0.1)).inner(), dec!(100.1));

        let price = Price::new(dec!(100.21));
        assert_eq!(price.bucket_ceil(dec!(0.5)).inner(), dec!(100.5));
    }

    #[test]
    fn test_bucket_exact_boundary() {
        // A price already on a boundary stays on it for both sides.
        let price = Price::new(dec!(100.0));
        assert_eq!(price.bucket_floor(dec!(0.1)).inner(), dec!(100.0));
        assert_eq!(price.bucket_ceil(dec!(0.1)).inner(), dec!(100.0));
    }

    #[test]
    fn test_bucket_zero_step_unchanged() {
        let price = Price::new(dec!(123.45));
        assert_eq!(price.bucket_floor(dec!(0)), price);
        assert_eq!(price.bucket_ceil(dec!(0)), price);
    }

    #[test]
    fn test_qty_notional() {
        let qty = Qty::new(dec!(0.5));
        let price = Price::new(dec!(50000));

        assert_eq!(qty.notional(price), dec!(25000));
    }

    #[test]
    fn test_price_parse_roundtrip() {
        let price: Price = "100.07".parse().unwrap();
        assert_eq!(price.inner(), dec!(100.07));
        assert_eq!(price.to_string(), "100.07");
    }
}
