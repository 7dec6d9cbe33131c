//! # billsplit-core: Pure Reconciliation Logic
//!
//! This crate is the **heart** of billsplit. It turns a parsed restaurant
//! bill into a validated expense request, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        billsplit Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              bill-server (POST /process_bill)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │     billsplit-ledger (resolver, orchestrator, Splitwise)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ billsplit-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   input   │  │aggregation│  │validation │  │  payload  │  │   │
//! │  │   │  shapes   │  │ per-person│  │ 0.01 tol. │  │ Expense   │  │   │
//! │  │   │ → Bill-   │  │ subtotals │  │ Equal /   │  │ Request   │  │   │
//! │  │   │ Submission│  │           │  │ Itemized  │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal `Money`
//! - [`types`] - Domain types (line items, memberships, plans, requests)
//! - [`input`] - External bill shapes and their canonical form
//! - [`aggregation`] - Per-person rollups
//! - [`roster`] - Display-name → member-id lookups
//! - [`plan`] - Split plan construction
//! - [`validation`] - Split reconciliation against the total
//! - [`payload`] - Expense request construction
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use billsplit_core::aggregation::aggregate;
//! use billsplit_core::money::Money;
//! use billsplit_core::types::BillLineItem;
//!
//! let items = vec![
//!     BillLineItem::new(Some("John"), "Pasta", Money::from_cents(1200)),
//!     BillLineItem::new(Some("John"), "Soda", Money::from_cents(150)),
//! ];
//! let aggregation = aggregate(&items).unwrap();
//! assert_eq!(aggregation.get("John").unwrap().total, Money::from_cents(1350));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregation;
pub mod error;
pub mod input;
pub mod money;
pub mod payload;
pub mod plan;
pub mod roster;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregation::{aggregate, Aggregation};
pub use error::{CoreError, CoreResult, ValidationError};
pub use input::{BillInput, BillSubmission, GroupRef, SplitMode};
pub use money::Money;
pub use payload::{DescriptionSource, ExpensePayloadBuilder, PayloadInput};
pub use types::*;
pub use validation::SplitValidator;
