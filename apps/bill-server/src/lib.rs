//! # bill-server
//!
//! HTTP boundary for billsplit.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         bill-server                                     │
//! │                                                                         │
//! │  POST /process_bill                                                    │
//! │       │  BillInput (either shape)                                       │
//! │       ▼                                                                 │
//! │  BillSubmission::try_from ──► 400 on bad input                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReconciliationOrchestrator::reconcile                                  │
//! │       │                                                                 │
//! │       ├── Ok  ──► 200 {"status": "success", "message", "reference"}     │
//! │       └── Err ──► 4xx/5xx {"status": "error", "message"}                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! `billsplit.toml` plus environment overrides, see
//! [`billsplit_ledger::config`]. `BILLSPLIT_CONFIG` points at an explicit
//! config file; `RUST_LOG` sets the log filter.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
