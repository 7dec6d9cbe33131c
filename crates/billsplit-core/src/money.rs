//! # Money Module
//!
//! Provides the `Money` type for handling bill amounts safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Bill items arrive as JSON numbers (12.0, 1.5, ...).                    │
//! │  Summed as f64:                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Exact decimals                                           │
//! │    JSON 0.1 is parsed through its shortest text form → 0.1 exactly      │
//! │    Sums and products are exact, so the 0.01 split tolerance only ever   │
//! │    absorbs display rounding, never binary float noise                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billsplit_core::money::Money;
//!
//! let pasta = Money::from_cents(1200); // 12.00
//! let soda: Money = "1.5".parse().unwrap();
//!
//! let total = pasta + soda;
//! assert_eq!(total.to_ledger_string(), "13.50");
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the bill's (single, implicit) currency.
///
/// ## Design Decisions
/// - **Decimal (not cents)**: item prices may carry more than two decimal
///   places, and validation must see the exact value to honour the
///   0.01 boundary
/// - **Transparent serde**: deserializes from JSON numbers or strings,
///   serializes as a decimal string (`"12.50"`); the ledger request is
///   form-encoded through [`Money::to_ledger_string`] instead
/// - **No currency field**: multi-currency handling is not supported
///
/// ## Where Money is Used
/// ```text
/// BillLineItem.cost ──► AggregatedPersonTotal.total ──► SplitPlan shares
///                                                            │
/// BillSubmission.declared_total ──► SplitValidator ◄─────────┘
///                                        │
///                                        ▼
///                              ExpenseRequest.cost / shares
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a raw decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use billsplit_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_ledger_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Adds two amounts; `None` when the result leaves `Decimal`'s range.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts `other`; `None` on overflow.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Multiplies a per-member share by a member count; `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use billsplit_core::money::Money;
    ///
    /// let each_share = Money::from_cents(1200);
    /// assert_eq!(each_share.checked_multiply_count(2), Some(Money::from_cents(2400)));
    /// ```
    #[inline]
    pub fn checked_multiply_count(&self, count: usize) -> Option<Money> {
        self.0.checked_mul(Decimal::from(count)).map(Money)
    }

    /// Sums amounts; `None` as soon as a partial sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }

    /// Divides evenly across `count` members, rounded to cents with
    /// Bankers Rounding. Returns `None` for a zero count.
    ///
    /// The rounded share times `count` may differ from the original by up to
    /// half a cent per member; callers validate the result like any other
    /// equal-split plan.
    pub fn split_evenly(&self, count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let share = self.0 / Decimal::from(count);
        Some(Money(share.round_dp_with_strategy(
            2,
            RoundingStrategy::MidpointNearestEven,
        )))
    }

    /// Formats the amount the way the ledger expects it: exactly two
    /// decimal places, Bankers Rounding, no currency symbol.
    ///
    /// ## Example
    /// ```rust
    /// use billsplit_core::money::Money;
    ///
    /// let amount: Money = "24".parse().unwrap();
    /// assert_eq!(amount.to_ledger_string(), "24.00");
    /// ```
    pub fn to_ledger_string(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
        format!("{:.2}", rounded)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows at least two decimal places; amounts with more precision keep
/// all of it so validation diagnostics never hide the real difference.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normalized = self.0.normalize();
        if normalized.scale() <= 2 {
            write!(f, "{:.2}", normalized)
        } else {
            write!(f, "{}", normalized)
        }
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Panics on overflow, like `Decimal`. Bill arithmetic goes through the
/// `checked_*` methods.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
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
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(1099), m("10.99"));
        assert_eq!(Money::from_cents(-550), m("-5.50"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(m("24.0").to_string(), "24.00");
        assert_eq!(m("24").to_string(), "24.00");
        assert_eq!(m("0.011").to_string(), "0.011");
        assert_eq!(m("-5.5").to_string(), "-5.50");
    }

    #[test]
    fn test_ledger_string_uses_bankers_rounding() {
        assert_eq!(m("12.5").to_ledger_string(), "12.50");
        assert_eq!(m("0.125").to_ledger_string(), "0.12");
        assert_eq!(m("0.135").to_ledger_string(), "0.14");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a + b, Money::from_cents(1500));
        assert_eq!(a - b, Money::from_cents(500));
        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
        assert_eq!(b.checked_sub(a), Some(Money::from_cents(-500)));
        assert_eq!(a.checked_multiply_count(3), Some(Money::from_cents(3000)));
    }

    #[test]
    fn test_overflow_is_reported_not_panicked() {
        let huge = m("50000000000000000000000000000");
        assert_eq!(huge.checked_multiply_count(2), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(Money::checked_sum([huge, huge, Money::from_cents(1)]), None);
        assert_eq!(huge.checked_multiply_count(1), Some(huge));
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        // 0.1 + 0.2 must be exactly 0.3, unlike f64
        let total = Money::checked_sum([m("0.1"), m("0.2")]);
        assert_eq!(total, Some(m("0.3")));
        assert_eq!(Money::checked_sum([]), Some(Money::zero()));
    }

    #[test]
    fn test_deserialize_from_json_number() {
        let parsed: Money = serde_json::from_str("12.0").unwrap();
        assert_eq!(parsed, Money::from_cents(1200));

        let parsed: Money = serde_json::from_str("0.1").unwrap();
        assert_eq!(parsed, m("0.1"));

        let parsed: Money = serde_json::from_str("\"9.99\"").unwrap();
        assert_eq!(parsed, Money::from_cents(999));
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, "\"12.50\"");
    }

    #[test]
    fn test_split_evenly() {
        assert_eq!(m("24").split_evenly(2), Some(Money::from_cents(1200)));
        // 10.00 / 3 = 3.33 each, one cent short when multiplied back
        let share = m("10").split_evenly(3).unwrap();
        assert_eq!(share, Money::from_cents(333));
        assert_eq!(share.checked_multiply_count(3), Some(Money::from_cents(999)));
        assert_eq!(m("10").split_evenly(0), None);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_negative());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-100).abs(), Money::from_cents(100));
    }
}
