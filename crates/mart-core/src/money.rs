//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With doubles, 0.1 + 0.2 = 0.30000000000000004                          │
//! │  and an invoice written as "%.2f" no longer matches the value the      │
//! │  till summed in memory.                                                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (paise / cents)                     │
//! │    Every amount is exact, and the 2-decimal text written to the        │
//! │    invoice file parses back to the very same value.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mart_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price * 3;                // 32.97
//! assert_eq!(line.to_string(), "32.97");
//! assert_eq!("32.97".parse::<Money>().unwrap(), line);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

use crate::types::{Percent, TaxRate};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts are subtracted, never stored negative,
///   but intermediate arithmetic may dip below zero
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► BillItem.unit_price ──► BillItem.line_total
///                                               │
///         Offer ──► BillItem.discount ──────────┘
///
/// Bill.subtotal ──► TaxRate ──► Invoice.tax ──► Invoice.total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion, truncated toward zero.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Whole currency units, rounded down.
    ///
    /// ```rust
    /// use mart_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(25075).whole_units(), 250);
    /// assert_eq!(Money::from_cents(-150).whole_units(), -2);
    /// ```
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0.div_euclid(100)
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `self * qty`, or `None` on overflow.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `self - other`, or `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Calculates tax on this amount, rounding half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use mart_core::money::Money;
    /// use mart_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(6000); // 60.00
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1800)); // 18%
    /// assert_eq!(tax.cents(), 1080); // 10.80
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(scale_bps(self.0, rate.bps()))
    }

    /// Returns `percent` of this amount, rounding half away from zero.
    ///
    /// This is the discount amount of a percentage offer, not the
    /// discounted price.
    ///
    /// ```rust
    /// use mart_core::money::Money;
    /// use mart_core::types::Percent;
    ///
    /// let gross = Money::from_cents(2997);
    /// assert_eq!(gross.percentage(Percent::from_bps(1000)).cents(), 300);
    /// ```
    pub fn percentage(&self, percent: Percent) -> Money {
        Money(scale_bps(self.0, percent.bps()))
    }
}

/// `amount * bps / 10000`, rounded half away from zero.
fn scale_bps(amount: i64, bps: u32) -> i64 {
    // i128 so that large line totals cannot overflow mid-calculation
    let scaled = amount as i128 * bps as i128;
    let rounded = if scaled >= 0 {
        (scaled + 5000) / 10000
    } else {
        (scaled - 5000) / 10000
    };
    rounded as i64
}

// =============================================================================
// Parsing
// =============================================================================

/// Failure to read a 2-decimal amount.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid amount: '{0}'")]
pub struct ParseMoneyError(pub String);

/// Parses `[-+]digits[.digits]` into hundredths.
///
/// Two fractional digits are kept; a third one rounds half away from
/// zero and anything beyond it is ignored, which is how `%.2f` values
/// and hand-edited files with extra precision both land on the same cent.
pub(crate) fn parse_hundredths(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let major: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    let digits = fraction.as_bytes();
    let mut minor: i64 = 0;
    for position in 0..2 {
        let digit = digits.get(position).map_or(0, |b| i64::from(b - b'0'));
        minor = minor * 10 + digit;
    }
    if digits.get(2).is_some_and(|b| *b >= b'5') {
        minor += 1;
    }

    let magnitude = major.checked_mul(100)?.checked_add(minor)?;
    Some(if negative { -magnitude } else { magnitude })
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hundredths(s)
            .map(Money)
            .ok_or_else(|| ParseMoneyError(s.to_string()))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Fixed 2-decimal rendering, exactly as stored in the invoice file.
///
/// No currency symbol: locale formatting belongs to whatever prints the
/// receipt.
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
