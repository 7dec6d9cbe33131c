//! # billsplit-db: Database Layer for billsplit
//!
//! SQLite storage for the one piece of state that outlives a request: the
//! group-name → group-id cache. Uses sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        billsplit Data Flow                              │
//! │                                                                         │
//! │  MemberResolver::resolve_group("Test")                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SqliteCacheStore (billsplit-ledger)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 billsplit-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐  ┌──────────────┐  │   │
//! │  │   │   Database    │    │   Repositories   │  │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ GroupCacheRepo   │  │  (embedded)  │  │   │
//! │  │   └───────────────┘    └──────────────────┘  └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (cache.path in billsplit.toml)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use billsplit_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/cache.db")).await?;
//! db.group_cache().upsert("test", 123456).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::group_cache::GroupCacheRepository;
