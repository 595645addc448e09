//! # Money Module
//!
//! Provides the `Money` type used for every cost, price, revenue and profit
//! figure in Stockroom.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE DRIFT PROBLEM                                                      │
//! │                                                                         │
//! │  Summing float prices over hundreds of sales:                           │
//! │    19.99 × 3 + 59.99 × 2 + ...  → 179.95000000000002                    │
//! │                                                                         │
//! │  Then profit = revenue - costs no longer matches Σ sale.profit.         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1999 × 3 + 5999 × 2 = 17995 cents, exactly, every time               │
//! │    Only ratios (margins, averages of units) become floats               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::from_cents(1999); // $19.99
//! let revenue = price.multiply_quantity(3);
//! assert_eq!(revenue.cents(), 5997);
//!
//! let total: Money = [price, Money::from_cents(1)].into_iter().sum();
//! assert_eq!(total.to_string(), "$20.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// Serializes as a bare integer, which is also the storage form.
///
/// ```text
/// Product.cost / Product.price ──► Sale snapshot (price, cost)
///                                        │
///                                        ▼
///                       Sale.total / Sale.total_cost / Sale.profit
///                                        │
///                                        ▼
///                  Analytics: revenue, costs, profit, per-category sums
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from dollars and cents.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(19, 99).cents(), 1999);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
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

    /// Multiplies money by a quantity. Saturates at the `i64` range, like
    /// every other operator on `Money`.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2999); // Wool Scarf
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 5998);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Divides by a count, rounding half away from zero.
    ///
    /// Returns zero when `count` is zero, which is what every average in
    /// the analytics module wants for an empty input.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).divide_rounded(3).cents(), 333);
    /// assert_eq!(Money::from_cents(1001).divide_rounded(2).cents(), 501);
    /// assert_eq!(Money::from_cents(1000).divide_rounded(0).cents(), 0);
    /// ```
    pub fn divide_rounded(&self, count: i64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        // i128 so the doubled numerator cannot overflow
        let num = self.0 as i128 * 2;
        let den = count as i128 * 2;
        let half = count.abs() as i128;
        let rounded = if (num < 0) != (den < 0) {
            (num - half) / den
        } else {
            (num + half) / den
        };
        Money(rounded as i64)
    }

    /// Expresses `self` as a percentage of `whole`.
    ///
    /// Zero when `whole` is zero, so a product with no price or a period with
    /// no revenue reports a 0% margin instead of dividing by zero.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let profit = Money::from_cents(500);
    /// let revenue = Money::from_cents(1000);
    /// assert_eq!(profit.percent_of(revenue), 50.0);
    /// assert_eq!(profit.percent_of(Money::zero()), 0.0);
    /// ```
    pub fn percent_of(&self, whole: Money) -> f64 {
        if whole.is_zero() {
            0.0
        } else {
            self.0 as f64 / whole.0 as f64 * 100.0
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders as `$19.99` / `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
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
