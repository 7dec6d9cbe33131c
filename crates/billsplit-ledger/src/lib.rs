//! # billsplit-ledger: Ledger Integration for billsplit
//!
//! Everything between a parsed bill and a recorded Splitwise expense that
//! needs I/O: group lookups, the group-id cache, expense submission and
//! the orchestration tying them to the pure core.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Reconciliation Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │              ReconciliationOrchestrator (orchestrator.rs)        │  │
//! │  │  one span per bill, stages Received → ... → Submitted            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ MemberResolver │  │ billsplit-core │  │  LedgerClient          │    │
//! │  │                │  │                │  │                        │    │
//! │  │ group name→id  │  │ aggregate      │  │  SplitwiseClient       │    │
//! │  │ roster         │  │ plan, validate │  │  POST /create_expense  │    │
//! │  │ GroupIdCache   │  │ build payload  │  │                        │    │
//! │  └───────┬────────┘  └────────────────┘  └────────────────────────┘    │
//! │          ▼                                                              │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │ CacheStore: JsonFileCacheStore | SqliteCacheStore | Memory     │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`orchestrator`] - `ReconciliationOrchestrator`
//! - [`resolver`] - `MemberResolver`
//! - [`cache`] - `GroupIdCache` and cache stores
//! - [`ports`] - Collaborator traits
//! - [`splitwise`] - Splitwise HTTP adapter
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Ledger error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billsplit_ledger::{LedgerConfig, ReconciliationOrchestrator};
//!
//! let config = LedgerConfig::load(None)?;
//! let client = Arc::new(SplitwiseClient::from_settings(&config.ledger)?);
//! let cache = GroupIdCache::load(Arc::new(JsonFileCacheStore::new("group_cache.json"))).await?;
//! let orchestrator = ReconciliationOrchestrator::new(
//!     MemberResolver::new(client.clone(), cache),
//!     client,
//!     config.ledger.capabilities(),
//!     config.reconcile.member_policy(),
//! );
//! let outcome = orchestrator.reconcile(&submission).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod resolver;
pub mod splitwise;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{GroupIdCache, JsonFileCacheStore, MemoryCacheStore, SqliteCacheStore};
pub use config::{CacheBackend, LedgerConfig};
pub use error::{LedgerError, LedgerResult};
pub use orchestrator::{
    PreparedExpense, ReconcileFailure, ReconcileOutcome, ReconcileStage,
    ReconciliationOrchestrator,
};
pub use ports::{CacheStore, GroupDirectory, LedgerAck, LedgerClient};
pub use resolver::MemberResolver;
pub use splitwise::SplitwiseClient;
