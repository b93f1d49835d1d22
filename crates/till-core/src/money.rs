//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Cents at Rest, Decimals in Flight
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stored values (prices, installments, cash movements)                   │
//! │    → always integer cents                                               │
//! │                                                                         │
//! │  Intermediate values (0.25 kg × price, annuity factors)                 │
//! │    → f64, because quantities and unit factors are fractional            │
//! │                                                                         │
//! │  Boundary: Money::from_decimal() rounds to the nearest cent, ONCE,      │
//! │  at the end of a calculation.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let total = price * 2 + Money::from_cents(500);
//! assert_eq!(total.cents(), 2698);
//!
//! // 0.25 kg at 10.99/kg = 2.7475 → 2.75
//! let line = Money::from_decimal(price.to_decimal() * 0.25);
//! assert_eq!(line.cents(), 275);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values appear in profit (selling below cost)
/// - **Single field tuple struct**: zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
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
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Rounds a decimal amount to the nearest cent.
    ///
    /// This is the only way a float becomes money. Non-finite input
    /// (NaN, ±∞) yields zero; callers that care check
    /// [`f64::is_finite`] first and log.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(367.2085).cents(), 36721);
    /// assert_eq!(Money::from_decimal(f64::NAN), Money::zero());
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        // Halves round up (toward +∞): -0.125 → -12, 0.125 → 13
        Money((amount * 100.0 + 0.5).floor() as i64)
    }

    /// Returns the value as a decimal amount (1099 → 10.99).
    #[inline]
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the value in cents.
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
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// `self + other`, `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies by a fractional factor and rounds to the nearest cent.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let amount = Money::from_cents(1000);
    /// assert_eq!(amount.scale(0.05).cents(), 50);
    /// ```
    pub fn scale(&self, factor: f64) -> Money {
        Money::from_decimal(self.to_decimal() * factor)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-style display. The UI formats with the store currency
/// (see `StoreConfig::format_currency` in till-db).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.cents_part())
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
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
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_from_decimal_rounds_half_up() {
        assert_eq!(Money::from_decimal(180.0).cents(), 18000);
        assert_eq!(Money::from_decimal(333.333_333).cents(), 33333);
        assert_eq!(Money::from_decimal(0.125).cents(), 13);
        assert_eq!(Money::from_decimal(-2.5).cents(), -250);
        assert_eq!(Money::from_decimal(-0.125).cents(), -12);
        assert_eq!(Money::from_decimal(-0.126).cents(), -13);
    }

    #[test]
    fn test_from_decimal_non_finite_is_zero() {
        assert!(Money::from_decimal(f64::NAN).is_zero());
        assert!(Money::from_decimal(f64::INFINITY).is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_add() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(Money::from_cents(1).checked_add(Money::from_cents(2)), Some(Money::from_cents(3)));
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        // Saturated conversions are caught by the next addition
        assert_eq!(Money::from_decimal(1e30).checked_add(Money::from_decimal(1e30)), None);
    }

    #[test]
    fn test_scale() {
        assert_eq!(Money::from_cents(36721).scale(0.05).cents(), 1836);
        assert_eq!(Money::from_cents(100).scale(0.0).cents(), 0);
    }

    /// 1000.00 split three ways loses a cent; the schedule keeps equal
    /// payments and the loss is visible here.
    #[test]
    fn test_division_precision_loss_documented() {
        let third = Money::from_decimal(1000.0 / 3.0);
        assert_eq!(third.cents(), 33333);
        assert_eq!((third * 3).cents(), 99999);
    }
}
