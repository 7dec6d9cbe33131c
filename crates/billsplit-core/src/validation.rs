//! # Validation Module
//!
//! Arithmetic reconciliation of a split plan against the bill total.
//!
//! ## Tolerance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  |expected - declared_total| ≤ 0.01  →  Ok                              │
//! │  |expected - declared_total| > 0.01  →  ValidationMismatch              │
//! │                                                                         │
//! │  Equal:     expected = each_share × member_count                        │
//! │  Itemized:  expected = Σ shares                                         │
//! │                                                                         │
//! │  The tolerance is ABSOLUTE. A 1,000.00 bill gets the same 0.01 slack    │
//! │  as a 10.00 bill; it only absorbs display rounding of shares.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billsplit_core::money::Money;
//! use billsplit_core::types::SplitPlan;
//! use billsplit_core::validation::SplitValidator;
//!
//! let plan = SplitPlan::Equal { each_share: Money::from_cents(1200), member_count: 2 };
//! assert!(SplitValidator::new().validate(Money::from_cents(2400), &plan).is_ok());
//! assert!(SplitValidator::new().validate(Money::from_cents(2500), &plan).is_err());
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::SplitPlan;

/// Allowed absolute difference between a plan and the declared total.
pub fn split_tolerance() -> Money {
    Money::from_cents(1)
}

/// Checks split plans against declared totals.
///
/// Stateless; validation never mutates anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitValidator;

impl SplitValidator {
    pub fn new() -> Self {
        SplitValidator
    }

    /// Validates `plan` against `declared_total`.
    ///
    /// ## Errors
    /// `ValidationMismatch { expected, actual }` where `expected` is the
    /// plan's total and `actual` the declared total.
    pub fn validate(&self, declared_total: Money, plan: &SplitPlan) -> CoreResult<()> {
        let expected = plan.planned_total()?;
        if reconciles(expected, declared_total) {
            Ok(())
        } else {
            Err(CoreError::ValidationMismatch {
                expected,
                actual: declared_total,
            })
        }
    }
}

/// True when two amounts agree within [`split_tolerance`].
///
/// Amounts too far apart to subtract do not reconcile.
pub fn reconciles(a: Money, b: Money) -> bool {
    a.checked_sub(b)
        .is_some_and(|difference| difference.abs() <= split_tolerance())
}

// =============================================================================
// Unit Tests
// =============================================================================
