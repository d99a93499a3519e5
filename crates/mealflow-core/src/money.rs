//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! charge bundle and total reconciliation used by the order aggregate.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A cart recomputed on every fee change drifts a cent at a time until   │
//! │  the stored total no longer reconciles with its parts.                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of minor units. Recomputing the total  │
//! │    any number of times yields the same cents.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Rule
//! Percentage application (tax) rounds **half-up to the minor unit**:
//! `(amount_cents * bps + 5000) / 10000` computed in i128. The rule is pinned
//! by tests; changing it changes stored totals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::{CoreError, CoreResult};
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate results (subtotal minus discount) may
///   dip below zero before the reconciliation check rejects them
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use mealflow_core::money::Money;
    ///
    /// let price = Money::from_cents(1699); // $16.99
    /// assert_eq!(price.cents(), 1699);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use mealflow_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(699); // $6.99
    /// let item_total = unit_price.multiply_quantity(2);
    /// assert_eq!(item_total.cents(), 1398); // $13.98
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a basis-point rate, rounding half-up to the minor unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000` in i128 so large
    /// amounts cannot overflow. The `+5000` is the half-up rounding term
    /// (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use mealflow_core::money::Money;
    /// use mealflow_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(3097); // $30.97
    /// let rate = TaxRate::from_bps(800);      // 8%
    ///
    /// // $30.97 × 8% = $2.4776 → rounds half-up to $2.48
    /// assert_eq!(subtotal.apply_rate(rate).cents(), 248);
    /// ```
    pub fn apply_rate(&self, rate: TaxRate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For logs and debugging. Presentation-layer formatting handles
/// localization.
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

/// Default money is zero.
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

// =============================================================================
// Charges & Total Reconciliation
// =============================================================================

/// The non-item charge components of an order.
///
/// Bundled so the aggregate can recompute its grand total from one value
/// instead of five loose parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Charges {
    pub delivery_fee: Money,
    pub tax: Money,
    pub service_fee: Money,
    pub tip: Money,
    /// Subtracted from the total; stored as a non-negative amount.
    pub discount: Money,
}

/// Computes the grand total from a subtotal and its charges.
///
/// ## Invariant
/// `total = subtotal + delivery_fee + tax + service_fee + tip - discount`
///
/// The result must be non-negative. A negative total means the pricing
/// inputs are faulty (discount exceeding the order), and the caller gets
/// [`CoreError::NegativeTotal`] instead of a silently clamped zero.
///
/// Pure and idempotent: recomputing with unchanged inputs yields the same
/// total.
pub fn compute_total(subtotal: Money, charges: &Charges) -> CoreResult<Money> {
    let total = subtotal + charges.delivery_fee + charges.tax + charges.service_fee + charges.tip
        - charges.discount;

    if total.is_negative() {
        return Err(CoreError::NegativeTotal {
            cents: total.cents(),
        });
    }

    Ok(total)
}

// =============================================================================
// Unit Tests
// =============================================================================
