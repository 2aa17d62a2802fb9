//! Precision-safe decimal types for portfolio math.
//!
//! Uses `rust_decimal` so that threshold comparisons such as
//! `102 / 100 >= 1.02` are exact.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Price per share with exact decimal precision.
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
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Ratio of this price to a reference price (`self / reference`).
    ///
    /// Returns `None` when the reference is zero.
    #[inline]
    pub fn ratio_to(&self, reference: Price) -> Option<Decimal> {
        if reference.0.is_zero() {
            return None;
        }
        Some(self.0 / reference.0)
    }

    /// Percentage change from a reference price.
    #[inline]
    pub fn pct_from(&self, reference: Price) -> Option<Decimal> {
        if reference.0.is_zero() {
            return None;
        }
        Some((self.0 - reference.0) / reference.0 * Decimal::from(100))
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
        Ok(Self(s.trim().parse()?))
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

/// Share quantity with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(pub Decimal);

impl Quantity {
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
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Market value of this quantity at `price`.
    #[inline]
    pub fn value_at(&self, price: Price) -> Decimal {
        self.0 * price.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<Decimal> for Quantity {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Mul<Price> for Quantity {
    type Output = Decimal;

    fn mul(self, rhs: Price) -> Self::Output {
        self.value_at(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_ratio_is_exact() {
        let price = Price::new(dec!(102));
        let avg = Price::new(dec!(100));
        assert_eq!(price.ratio_to(avg), Some(dec!(1.02)));
    }

    #[test]
    fn test_price_ratio_zero_reference() {
        assert_eq!(Price::new(dec!(5)).ratio_to(Price::ZERO), None);
    }

    #[test]
    fn test_price_pct_from() {
        let price = Price::new(dec!(103.1));
        let avg = Price::new(dec!(100));
        assert_eq!(price.pct_from(avg), Some(dec!(3.1)));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let price: Price = " 189.9800 ".parse().unwrap();
        assert_eq!(price.inner(), dec!(189.98));
        assert!("abc".parse::<Price>().is_err());
    }

    #[test]
    fn test_quantity_value() {
        let qty = Quantity::new(dec!(3));
        assert_eq!(qty * Price::new(dec!(10.5)), dec!(31.5));
        assert!(qty.is_positive());
        assert!(!Quantity::ZERO.is_positive());
    }
}
