//! Type-safe price representation using decimal arithmetic.
//!
//! All amounts are US dollars. Prices are never negative; arithmetic that
//! could produce a negative value (subtraction) is intentionally not offered.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative amount of money.
///
/// ```
/// use coza_core::Price;
///
/// let price = Price::parse("16.64").unwrap();
/// assert_eq!(price.to_string(), "$16.64");
/// assert_eq!(price.times(3).to_string(), "$49.92");
///
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("abc").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Parse a price from user input such as `"16.64"` or `" 75 "`.
    ///
    /// A leading `$` is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a number, or negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        let s = s.strip_prefix('$').unwrap_or(s).trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount: Decimal = s.parse().map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The amount in dollars.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Multiply by a non-negative rate, rounding to cents.
    ///
    /// Midpoints round away from zero, so `0.125` becomes `0.13`.
    #[must_use]
    pub fn scaled(self, rate: Decimal) -> Self {
        let scaled = (self.0 * rate.abs())
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self(scaled)
    }

    /// Round to whole cents.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "${cents:.2}")
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Price::parse("16.64").unwrap().amount(), Decimal::new(1664, 2));
        assert_eq!(Price::parse(" 75 ").unwrap().amount(), Decimal::from(75));
        assert_eq!(Price::parse("$9.99").unwrap().amount(), Decimal::new(999, 2));
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("  "), Err(PriceError::Empty));
        assert_eq!(Price::parse("twelve"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::parse("199.99").unwrap().to_string(), "$199.99");
        assert_eq!(Price::parse("75").unwrap().to_string(), "$75.00");
        assert_eq!(Price::parse("0.125").unwrap().to_string(), "$0.13");
    }

    #[test]
    fn test_times_and_sum() {
        let a = Price::parse("10").unwrap().times(2);
        let b = Price::parse("2.50").unwrap().times(3);
        let total: Price = [a, b].into_iter().sum();
        assert_eq!(total, Price::parse("27.50").unwrap());
    }

    #[test]
    fn test_scaled_rounds_midpoint_away_from_zero() {
        let price = Price::parse("1.5625").unwrap();
        assert_eq!(price.scaled(Decimal::ONE).amount(), Decimal::new(156, 2));
        let tax = Price::parse("100.00").unwrap().scaled(Decimal::new(8, 2));
        assert_eq!(tax, Price::parse("8").unwrap());
    }

    #[test]
    fn test_serde_rejects_negative() {
        let price: Price = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(price, Price::parse("12.5").unwrap());
        assert!(serde_json::from_str::<Price>("\"-3\"").is_err());
    }
}
