//! # Collaborator Ports
//!
//! The traits the orchestrator talks through. Production code plugs in
//! [`SplitwiseClient`](crate::splitwise::SplitwiseClient) and a cache store;
//! tests plug in stubs.
//!
//! ```text
//!                ┌────────────────────────────┐
//!                │ ReconciliationOrchestrator │
//!                └──────┬──────────┬──────────┘
//!                       │          │
//!        ┌──────────────▼───┐  ┌───▼───────────┐  ┌──────────────┐
//!        │  GroupDirectory  │  │ LedgerClient  │  │  CacheStore  │
//!        │  list_groups     │  │ create_expense│  │  load / save │
//!        │  get_members     │  └───────────────┘  └──────────────┘
//!        └──────────────────┘
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use billsplit_core::{ExpenseRequest, GroupId, GroupSummary, Member};

use crate::error::LedgerResult;

/// Lists groups and their rosters.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Every group visible to the authenticated user.
    async fn list_groups(&self) -> LedgerResult<Vec<GroupSummary>>;

    /// Current roster of one group.
    async fn get_members(&self, group_id: GroupId) -> LedgerResult<Vec<Member>>;
}

/// Records expenses.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Submits one expense.
    ///
    /// A rejection carries the upstream status and body as
    /// [`LedgerError::Remote`](crate::error::LedgerError::Remote).
    async fn create_expense(&self, request: &ExpenseRequest) -> LedgerResult<LedgerAck>;
}

/// Persists the group-name → group-id cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Loads every persisted entry. A store that has never been written
    /// loads empty.
    async fn load(&self) -> LedgerResult<HashMap<String, GroupId>>;

    /// Persists the full mapping.
    async fn save(&self, entries: &HashMap<String, GroupId>) -> LedgerResult<()>;
}

/// What the ledger returned for an accepted expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerAck {
    /// Ledger-side expense ids, when the response included them.
    pub expense_ids: Vec<i64>,
}
