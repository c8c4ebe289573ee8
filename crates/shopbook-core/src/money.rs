//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Credit installments:                                                   │
//! │    $100.00 / 3 = $33.33 (×3 = $99.99)                                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    10000 cents / 3 = 3333 cents (×3 = 9999 cents)                      │
//! │    The installment is informational; the balance is always             │
//! │    total - paid, so the lost cent is collected by the last payment     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopbook_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // $10.99
//!
//! // Arithmetic operations
//! let doubled = price.checked_quantity(2); // Some($21.98)
//! let total = price + Money::from_cents(500); // $15.99
//!
//! // NEVER do this:
//! // let bad = Money::from_float(10.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, discounts
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Product.price_client ──► Sale.unit_price ──► Sale.total               │
/// │                                                  │                      │
/// │                                                  ▼                      │
/// │  Credit.total ──► installment_amount        CreditPayment.amount       │
/// │       │                                          │                      │
/// │       └──────────► Credit.remaining ◄────────────┘                      │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    ///
    /// ## Why Cents?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// The database, calculations, and API all use cents.
    /// Only the UI converts to dollars for display.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.dollars(), 10);
    ///
    /// let negative = Money::from_cents(-550);
    /// assert_eq!(negative.dollars(), -5);
    /// ```
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents_part(), 99);
    ///
    /// let negative = Money::from_cents(-550);
    /// assert_eq!(negative.cents_part(), 50); // Absolute value
    /// ```
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// let zero = Money::zero();
    /// assert_eq!(zero.cents(), 0);
    /// ```
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies money by a quantity, or `None` when the product does not
    /// fit in cents.
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// assert_eq!(unit_price.checked_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX / 2).checked_quantity(3), None);
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Lager 6-pack $2.99
    /// Quantity: 3
    ///      │
    ///      ▼
    /// checked_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Sale Total: $8.97
    /// ```
    #[inline]
    pub const fn checked_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Divides the amount into `parts` equal shares, rounded to the nearest
    /// cent (half away from zero). No remainder is redistributed.
    ///
    /// ## Example
    /// ```rust
    /// use shopbook_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(60_000).split_evenly(4).cents(), 15_000);
    /// assert_eq!(Money::from_cents(10_000).split_evenly(3).cents(), 3_333);
    /// assert_eq!(Money::from_cents(200).split_evenly(3).cents(), 67);
    /// ```
    pub fn split_evenly(&self, parts: i64) -> Money {
        let parts = parts.max(1) as i128;
        let amount = self.0 as i128;
        let share = (2 * amount.abs() + parts) / (2 * parts);
        Money::from_cents((amount.signum() * share) as i64)
    }

    /// Formats the amount as a plain decimal ("150.00", "-5.50") for exports.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// Receipts print this form; CSV exports use [`Money::to_decimal_string`].
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

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
