//! Type-safe price representation using decimal arithmetic.
//!
//! The shop sells in euros only, so a price is a non-negative decimal amount
//! with a fixed currency. Amounts are captured from the catalog as JSON
//! numbers and summed exactly with [`Decimal`] instead of floating point.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A price in euros.
///
/// Serialized as a plain JSON number. Negative amounts are rejected on
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] Decimal);

impl Price {
    /// Currency symbol used when displaying prices.
    pub const SYMBOL: &'static str = "€";

    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// Negative amounts are clamped to zero; the catalog never sells at a
    /// negative price.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.max(Decimal::ZERO))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Price of `quantity` units, or `None` on overflow.
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Sum of two prices, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Format for display, rounded to cents (e.g., `€12.50`).
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", Self::SYMBOL, self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        if amount < Decimal::ZERO {
            return Err(D::Error::custom(format!("negative price {amount}")));
        }
        Ok(Self(amount))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        self.times(rhs)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Price::from_cents(1250).display(), "€12.50");
        assert_eq!(Price::new(Decimal::new(8, 0)).display(), "€8.00");
        assert_eq!(Price::ZERO.to_string(), "€0.00");
    }

    #[test]
    fn test_negative_amount_clamped() {
        assert_eq!(Price::new(Decimal::new(-5, 0)), Price::ZERO);
    }

    #[test]
    fn test_sum_is_exact() {
        let total: Price = [Price::from_cents(1599).times(3), Price::from_cents(875)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(5672));
    }

    #[test]
    fn test_deserializes_json_number() {
        let price: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(price, Price::from_cents(1250));
    }

    #[test]
    fn test_serializes_as_json_number() {
        assert_eq!(serde_json::to_string(&Price::from_cents(1250)).unwrap(), "12.5");
        assert_eq!(serde_json::to_string(&Price::ZERO).unwrap(), "0.0");
    }

    #[test]
    fn test_negative_json_rejected() {
        assert!(serde_json::from_str::<Price>("-3.5").is_err());
    }

    #[test]
    fn test_overflow_does_not_panic() {
        let huge: Price = serde_json::from_str("1e25").unwrap();
        assert_eq!(huge.checked_times(100_000), None);
        assert_eq!(huge.times(100_000).amount(), Decimal::MAX);
        assert_eq!(Price::new(Decimal::MAX).checked_add(huge), None);
        assert_eq!((Price::new(Decimal::MAX) + huge).amount(), Decimal::MAX);
        assert_eq!(
            Price::from_cents(1599).checked_times(3),
            Some(Price::from_cents(4797))
        );
    }
}
