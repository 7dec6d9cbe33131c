//! # Member Resolver
//!
//! Maps human-readable group and member names to ledger ids.
//!
//! ```text
//! resolve_group("Dinner Friends")
//!      │
//!      ├── GroupIdCache hit ──────────────────────────────► 123456
//!      │
//!      └── miss → GroupDirectory::list_groups()
//!                   │  case-insensitive exact name match
//!                   ├── found → cache.insert (write-through) ► 123456
//!                   └── none  → GroupNotFound (never cached)
//!
//! resolve_members(123456) → GroupDirectory::get_members (always fresh)
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use billsplit_core::roster;
use billsplit_core::{GroupId, GroupMembership, MemberId};

use crate::cache::{cache_key, GroupIdCache};
use crate::error::{LedgerError, LedgerResult};
use crate::ports::GroupDirectory;

/// Resolves group names and member display names.
#[derive(Clone)]
pub struct MemberResolver {
    directory: Arc<dyn GroupDirectory>,
    cache: GroupIdCache,
}

impl std::fmt::Debug for MemberResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl MemberResolver {
    pub fn new(directory: Arc<dyn GroupDirectory>, cache: GroupIdCache) -> Self {
        MemberResolver { directory, cache }
    }

    pub fn cache(&self) -> &GroupIdCache {
        &self.cache
    }

    /// Resolves a group name to its id, cache first.
    ///
    /// Matching is case-insensitive. Two concurrent misses for the same
    /// name both query the directory and both persist the same id.
    /// A failed cache write is logged; the resolution still succeeds.
    pub async fn resolve_group(&self, group_name: &str) -> LedgerResult<GroupId> {
        if let Some(group_id) = self.cache.get(group_name).await {
            debug!(group_name = %group_name, group_id, "Group cache hit");
            return Ok(group_id);
        }

        debug!(group_name = %group_name, "Group cache miss, listing groups");
        let wanted = cache_key(group_name);
        let groups = self.directory.list_groups().await?;

        let group = groups
            .into_iter()
            .find(|g| cache_key(&g.name) == wanted)
            .ok_or_else(|| LedgerError::GroupNotFound(group_name.to_string()))?;

        info!(group_name = %group_name, group_id = group.id, "Resolved group");

        if let Err(e) = self.cache.insert(group_name, group.id).await {
            warn!(group_name = %group_name, error = %e, "Failed to persist group cache");
        }

        Ok(group.id)
    }

    /// Fetches the current roster of a group.
    ///
    /// `group_name` is only carried into the returned membership.
    pub async fn resolve_members(
        &self,
        group_id: GroupId,
        group_name: &str,
    ) -> LedgerResult<GroupMembership> {
        let members = self.directory.get_members(group_id).await?;
        if members.is_empty() {
            return Err(LedgerError::EmptyGroup(group_id));
        }

        debug!(group_id, member_count = members.len(), "Resolved members");

        Ok(GroupMembership {
            group_id,
            group_name: group_name.to_string(),
            members,
        })
    }

    /// Soft member lookup: exact, case-sensitive display name match, or
    /// [`UNRESOLVED_MEMBER_ID`](billsplit_core::UNRESOLVED_MEMBER_ID).
    pub fn resolve_member_id(&self, display_name: &str, membership: &GroupMembership) -> MemberId {
        roster::resolve_member_id(display_name, membership)
    }

    /// Member lookup that reports a miss as `None`.
    pub fn find_member_id(
        &self,
        display_name: &str,
        membership: &GroupMembership,
    ) -> Option<MemberId> {
        roster::find_member_id(display_name, membership)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use async_trait::async_trait;
    use billsplit_core::{GroupSummary, Member, UNRESOLVED_MEMBER_ID};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingDirectory {
        groups: Vec<GroupSummary>,
        members: HashMap<GroupId, Vec<Member>>,
        list_calls: AtomicUsize,
        member_calls: AtomicUsize,
    }

    #[async_trait]
    impl GroupDirectory for CountingDirectory {
        async fn list_groups(&self) -> LedgerResult<Vec<GroupSummary>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.groups.clone())
        }

        async fn get_members(&self, group_id: GroupId) -> LedgerResult<Vec<Member>> {
            self.member_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.members.get(&group_id).cloned().unwrap_or_default())
        }
    }

    fn directory() -> Arc<CountingDirectory> {
        Arc::new(CountingDirectory {
            groups: vec![
                GroupSummary {
                    id: 123456,
                    name: "Dinner Friends".to_string(),
                },
                GroupSummary {
                    id: 7,
                    name: "Empty".to_string(),
                },
            ],
            members: HashMap::from([(
                123456,
                vec![Member::new(11, "John"), Member::new(22, "Mary")],
            )]),
            ..Default::default()
        })
    }

    async fn resolver(directory: Arc<CountingDirectory>) -> (MemberResolver, Arc<MemoryCacheStore>) {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = GroupIdCache::load(store.clone()).await.unwrap();
        (MemberResolver::new(directory, cache), store)
    }

    #[tokio::test]
    async fn test_resolve_group_twice_hits_directory_once() {
        let dir = directory();
        let (resolver, store) = resolver(dir.clone()).await;

        assert_eq!(resolver.resolve_group("Dinner Friends").await.unwrap(), 123456);
        assert_eq!(resolver.resolve_group("Dinner Friends").await.unwrap(), 123456);

        assert_eq!(dir.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.snapshot().await.get("dinner friends"), Some(&123456));
    }

    #[tokio::test]
    async fn test_resolve_group_ignores_case() {
        let dir = directory();
        let (resolver, _) = resolver(dir.clone()).await;

        assert_eq!(resolver.resolve_group("dinner friends").await.unwrap(), 123456);
        assert_eq!(resolver.resolve_group("Dinner Friends").await.unwrap(), 123456);
        assert_eq!(dir.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_group_not_found_is_not_cached() {
        let dir = directory();
        let (resolver, store) = resolver(dir.clone()).await;

        for _ in 0..2 {
            let err = resolver.resolve_group("Ski Trip").await.unwrap_err();
            assert!(matches!(err, LedgerError::GroupNotFound(ref n) if n == "Ski Trip"));
        }

        assert_eq!(dir.list_calls.load(Ordering::SeqCst), 2);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_members_is_always_fresh() {
        let dir = directory();
        let (resolver, _) = resolver(dir.clone()).await;

        let membership = resolver.resolve_members(123456, "Dinner Friends").await.unwrap();
        resolver.resolve_members(123456, "Dinner Friends").await.unwrap();

        assert_eq!(membership.member_count(), 2);
        assert_eq!(membership.group_name, "Dinner Friends");
        assert_eq!(dir.member_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_group() {
        let (resolver, _) = resolver(directory()).await;
        let err = resolver.resolve_members(7, "Empty").await.unwrap_err();
        assert!(matches!(err, LedgerError::EmptyGroup(7)));
    }

    #[tokio::test]
    async fn test_member_lookup() {
        let (resolver, _) = resolver(directory()).await;
        let membership = resolver.resolve_members(123456, "Dinner Friends").await.unwrap();

        assert_eq!(resolver.resolve_member_id("Mary", &membership), 22);
        assert_eq!(resolver.resolve_member_id("mary", &membership), UNRESOLVED_MEMBER_ID);
        assert_eq!(resolver.resolve_member_id("Zed", &membership), UNRESOLVED_MEMBER_ID);
        assert_eq!(resolver.find_member_id("John", &membership), Some(11));
        assert_eq!(resolver.find_member_id("Zed", &membership), None);
    }
}
