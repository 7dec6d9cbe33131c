//! # Ledger Error Types
//!
//! Error types for everything past the pure core: directory lookups,
//! expense submission, cache persistence and configuration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ledger Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Reconcile     │  │   Resolution    │  │     Remote              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core(..)       │  │  GroupNotFound  │  │  Remote{status, body}   │ │
//! │  │  (attribution,  │  │  EmptyGroup     │  │  Directory              │ │
//! │  │  mismatch, ...) │  │                 │  │  Transport / Parse      │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │     Cache       │  │     Config      │                              │
//! │  │  store load /   │  │  file, env,     │                              │
//! │  │  save failures  │  │  validation     │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these is retried by the orchestrator.

use billsplit_core::CoreError;
use thiserror::Error;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger error type covering every failure after input parsing.
#[derive(Debug, Error)]
pub enum LedgerError {
    // =========================================================================
    // Reconciliation Errors
    // =========================================================================
    /// A pure reconciliation step rejected the bill.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Resolution Errors
    // =========================================================================
    /// No directory group matches the requested name.
    #[error("Group '{0}' not found")]
    GroupNotFound(String),

    /// The group exists but has no members.
    #[error("No members found in group {0}")]
    EmptyGroup(i64),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The ledger rejected the expense.
    #[error("Ledger rejected the expense (status {status}): {body}")]
    Remote { status: u16, body: String },

    /// The group directory failed to answer.
    #[error("Group directory error: {0}")]
    Directory(String),

    /// The request never got a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response arrived but could not be decoded.
    #[error("Unexpected response: {0}")]
    Parse(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// The group-id cache store failed.
    #[error("Cache store error: {0}")]
    Cache(String),

    /// Invalid or unreadable configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<billsplit_db::DbError> for LedgerError {
    fn from(err: billsplit_db::DbError) -> Self {
        LedgerError::Cache(err.to_string())
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LedgerError::Parse(err.to_string())
        } else {
            LedgerError::Transport(err.to_string())
        }
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

impl From<url::ParseError> for LedgerError {
    fn from(err: url::ParseError) -> Self {
        LedgerError::Config(format!("invalid URL: {err}"))
    }
}

// =============================================================================
// Error Categorization (for boundary mapping)
// =============================================================================

impl LedgerError {
    /// Returns true if the caller's bill or request is at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            LedgerError::Core(_) | LedgerError::GroupNotFound(_) | LedgerError::EmptyGroup(_) => {
                true
            }
            _ => false,
        }
    }

    /// Returns true if an upstream service is at fault.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            LedgerError::Remote { .. }
                | LedgerError::Directory(_)
                | LedgerError::Transport(_)
                | LedgerError::Parse(_)
        )
    }

    /// Returns true if local state (cache, config) is at fault.
    pub fn is_local(&self) -> bool {
        matches!(self, LedgerError::Cache(_) | LedgerError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billsplit_core::Money;

    #[test]
    fn test_categories() {
        assert!(LedgerError::GroupNotFound("Trip".into()).is_client_error());
        assert!(LedgerError::EmptyGroup(7).is_client_error());
        assert!(LedgerError::Core(CoreError::UnsupportedSplit).is_client_error());

        let remote = LedgerError::Remote {
            status: 401,
            body: "unauthorized".into(),
        };
        assert!(remote.is_remote());
        assert!(!remote.is_client_error());

        assert!(LedgerError::Cache("disk full".into()).is_local());
    }

    #[test]
    fn test_core_errors_keep_their_message() {
        let err: LedgerError = CoreError::ValidationMismatch {
            expected: Money::from_cents(2400),
            actual: Money::from_cents(2500),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Split validation failed: expected 24.00, but total is 25.00"
        );
    }

    #[test]
    fn test_remote_display_includes_status_and_body() {
        let err = LedgerError::Remote {
            status: 400,
            body: "{\"base\":[\"Invalid cost\"]}".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("400"));
        assert!(msg.contains("Invalid cost"));
    }
}
