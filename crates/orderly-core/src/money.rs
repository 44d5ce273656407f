//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and the
//! `ExchangeRate` used to express an order total in another currency.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (cents)                              │
//! │    price 200.00 → 20000 cents, 3 units → 60000 cents, exact            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use orderly_core::money::{ExchangeRate, Money};
//!
//! let unit_price = Money::from_cents(20_000); // 200.00
//! let line_total = unit_price.checked_mul_quantity(5).unwrap();
//! assert_eq!(line_total.cents(), 100_000);
//!
//! // 1000.00 local units per foreign unit
//! let rate = ExchangeRate::parse("1.000,00").unwrap();
//! assert_eq!(line_total.convert(rate).unwrap().cents(), 100); // 1.00 foreign
//! ```
//!
//! ## Overflow
//! Totals are built with the `checked_*` methods, which return `None` when
//! the result leaves the `i64` range. The operator impls are for amounts
//! already known to be small.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences between totals can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - The currency code travels next to the amount (see `Product::currency`),
///   `Money` itself is currency-agnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use orderly_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies money by a quantity, or `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use orderly_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_mul_quantity(3).map(|m| m.cents()), Some(897));
    /// assert_eq!(unit_price.checked_mul_quantity(i64::MAX), None);
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts, or `None` if any partial sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }

    /// Converts this amount into the currency priced by `rate`.
    ///
    /// The rate is "local units per one foreign unit", so the local amount is
    /// divided by it. Halves round away from zero. Returns `None` when a
    /// tiny rate pushes the result out of the `i64` range.
    ///
    /// ## Example
    /// ```rust
    /// use orderly_core::money::{ExchangeRate, Money};
    ///
    /// let total = Money::from_cents(60_000);              // 600.00 local
    /// let rate = ExchangeRate::parse("300").unwrap();     // 300 local = 1 foreign
    /// assert_eq!(total.convert(rate).unwrap().cents(), 200); // 2.00 foreign
    /// ```
    pub fn convert(&self, rate: ExchangeRate) -> Option<Money> {
        // i128 keeps cents * scale from overflowing on large totals
        let numerator = self.0 as i128 * ExchangeRate::SCALE as i128;
        let denominator = rate.scaled() as i128;

        let mut quotient = numerator / denominator;
        let remainder = numerator % denominator;
        if remainder.abs() * 2 >= denominator {
            quotient += numerator.signum();
        }

        i64::try_from(quotient).ok().map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, e.g. `1234.50`. The currency code is appended by
/// whoever knows it.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}


// =============================================================================
// Exchange Rate
// =============================================================================

/// Price of one foreign currency unit in local currency, fixed-point with
/// four decimals.
///
/// Rates come from an external quote service. This type only carries and
/// parses them; fetching is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExchangeRate(i64);

impl ExchangeRate {
    /// Fixed-point scale: 1.0 == 10_000.
    pub const SCALE: i64 = 10_000;

    const DECIMALS: usize = 4;

    /// Creates a rate from its scaled representation (`1.0 == 10_000`).
    pub fn from_scaled(scaled: i64) -> Result<Self, ValidationError> {
        if scaled <= 0 {
            return Err(ValidationError::InvalidFormat {
                field: "exchange_rate".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(ExchangeRate(scaled))
    }

    /// Returns the scaled representation.
    #[inline]
    pub const fn scaled(&self) -> i64 {
        self.0
    }

    /// Parses a decimal quote.
    ///
    /// Both `1234.56` and the comma-decimal form `1.234,56` are accepted: when
    /// a comma is present it is the decimal separator and dots are thousands
    /// separators.
    ///
    /// ## Example
    /// ```rust
    /// use orderly_core::money::ExchangeRate;
    ///
    /// assert_eq!(ExchangeRate::parse("1.234,56").unwrap().scaled(), 12_345_600);
    /// assert_eq!(ExchangeRate::parse("1234.56").unwrap().scaled(), 12_345_600);
    /// assert!(ExchangeRate::parse("abc").is_err());
    /// ```
    pub fn parse(quote: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "exchange_rate".to_string(),
            reason: reason.to_string(),
        };

        let quote = quote.trim();
        let normalized = if quote.contains(',') {
            quote.replace('.', "").replace(',', ".")
        } else {
            quote.to_string()
        };

        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (normalized.as_str(), ""),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number"));
        }
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number"));
        }
        if fraction.len() > Self::DECIMALS {
            return Err(invalid("at most 4 decimal places are supported"));
        }

        let whole: i64 = whole.parse().map_err(|_| invalid("value is too large"))?;
        let padded = format!("{:0<width$}", fraction, width = Self::DECIMALS);
        let fraction: i64 = padded.parse().map_err(|_| invalid("expected a decimal number"))?;

        let scaled = whole
            .checked_mul(Self::SCALE)
            .and_then(|w| w.checked_add(fraction))
            .ok_or_else(|| invalid("value is too large"))?;

        Self::from_scaled(scaled)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.checked_mul_quantity(3), Some(Money::from_cents(3000)));

        let total = Money::checked_sum(vec![a, b, b]);
        assert_eq!(total, Some(Money::from_cents(2000)));
        assert_eq!(Money::checked_sum(Vec::new()), Some(Money::zero()));
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        // 999,999,999,999.99 × 1,000,000 units does not fit in i64 cents
        let price = Money::from_cents(99_999_999_999_999);
        assert_eq!(price.checked_mul_quantity(1_000_000), None);

        let big = Money::from_cents(i64::MAX - 1);
        assert_eq!(big.checked_add(Money::from_cents(1)), Some(Money::from_cents(i64::MAX)));
        assert_eq!(big.checked_add(Money::from_cents(2)), None);
        assert_eq!(Money::checked_sum(vec![big, big]), None);
    }

    #[test]
    fn test_convert_overflow() {
        let smallest = ExchangeRate::from_scaled(1).unwrap();
        assert_eq!(Money::from_cents(i64::MAX).convert(smallest), None);
        assert_eq!(
            Money::from_cents(100).convert(smallest),
            Some(Money::from_cents(1_000_000))
        );
    }

    #[test]
    fn test_parse_rate_formats() {
        assert_eq!(ExchangeRate::parse("300").unwrap().scaled(), 3_000_000);
        assert_eq!(ExchangeRate::parse("300,5").unwrap().scaled(), 3_005_000);
        assert_eq!(ExchangeRate::parse("1.025,75").unwrap().scaled(), 10_257_500);
        assert_eq!(ExchangeRate::parse(" 0.0001 ").unwrap().scaled(), 1);
    }

    #[test]
    fn test_parse_rate_rejects_garbage() {
        assert!(ExchangeRate::parse("").is_err());
        assert!(ExchangeRate::parse("-3").is_err());
        assert!(ExchangeRate::parse("0").is_err());
        assert!(ExchangeRate::parse("1.23456").is_err());
        assert!(ExchangeRate::parse("12a").is_err());
    }

    #[test]
    fn test_convert_rounds_half_away_from_zero() {
        let rate = ExchangeRate::parse("3").unwrap();

        // 1.00 / 3 = 0.333.. → 0.33
        assert_eq!(Money::from_cents(100).convert(rate).unwrap().cents(), 33);
        // 0.05 / 3 = 0.01666.. → 0.02
        assert_eq!(Money::from_cents(5).convert(rate).unwrap().cents(), 2);
        // negative amounts mirror positive ones
        assert_eq!(Money::from_cents(-5).convert(rate).unwrap().cents(), -2);
    }

    #[test]
    fn test_convert_identity_rate() {
        let rate = ExchangeRate::from_scaled(ExchangeRate::SCALE).unwrap();
        assert_eq!(Money::from_cents(123_456).convert(rate).unwrap().cents(), 123_456);
    }
}
