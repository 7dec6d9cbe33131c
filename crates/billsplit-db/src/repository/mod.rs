//! # Repository Module
//!
//! Database repository implementations for billsplit.
//!
//! ```text
//! Cache store (billsplit-ledger)
//!      │
//!      │  db.group_cache().load_all()
//!      ▼
//! GroupCacheRepository
//! ├── load_all(&self)
//! ├── get(&self, name_key)
//! ├── upsert(&self, name_key, group_id)
//! └── upsert_all(&self, entries)
//!      │
//!      ▼
//! SQLite Database
//! ```
//!
//! ## Available Repositories
//!
//! - [`group_cache::GroupCacheRepository`] - Group name → id cache

pub mod group_cache;
