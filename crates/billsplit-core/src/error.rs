//! # Error Types
//!
//! Domain-specific error types for billsplit-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billsplit-core errors (this file)                                     │
//! │  ├── CoreError        - Reconciliation failures                        │
//! │  └── ValidationError  - Malformed bill input                           │
//! │                                                                         │
//! │  billsplit-db errors (separate crate)                                  │
//! │  └── DbError          - Cache table failures                           │
//! │                                                                         │
//! │  billsplit-ledger errors (separate crate)                              │
//! │  └── LedgerError      - Resolver / remote / orchestration failures     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → ApiError → caller   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Reconciliation errors raised by the pure engine components.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line item carries no person, so it cannot be attributed in an
    /// itemized split.
    #[error("Item '{item_name}' is not attributed to a person")]
    MissingAttribution { item_name: String },

    /// The split does not reconcile with the declared total.
    ///
    /// ## Example
    /// ```text
    /// each_share 12.00 × 2 members = 24.00 (expected)
    /// declared total              = 25.00 (actual)
    /// |24.00 - 25.00| > 0.01  →  ValidationMismatch
    /// ```
    #[error("Split validation failed: expected {expected}, but total is {actual}")]
    ValidationMismatch { expected: Money, actual: Money },

    /// Itemized shares were requested but the ledger contract only accepts
    /// equal splits.
    #[error("Unequal splitting is not supported by the ledger")]
    UnsupportedSplit,

    /// An aggregated person has no matching group member.
    #[error("No group member named '{name}'")]
    UnresolvedMember { name: String },

    /// An equal split needs at least one member to divide by.
    #[error("Cannot split equally across zero members")]
    NoMembers,

    /// Validation error (wraps ValidationError).
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Bill input validation errors.
///
/// Raised while adapting an external bill shape into a `BillSubmission`,
/// before any reconciliation step runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g., invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// An amount, or a sum or product of amounts, left the decimal range.
    pub fn overflow(field: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: "amount is out of range".to_string(),
        }
    }

    pub fn negative(field: impl Into<String>) -> Self {
        ValidationError::Negative {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
