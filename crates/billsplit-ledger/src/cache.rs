//! # Group-Id Cache
//!
//! Process-wide `group name → group id` cache, persisted through a
//! [`CacheStore`].
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  startup        GroupIdCache::load(store)  ← store.load() once          │
//! │                                                                         │
//! │  per request    get("Dinner Friends")      ← key "dinner friends"       │
//! │                   hit  → id                                             │
//! │                   miss → resolver asks the directory, then              │
//! │                          insert(name, id)  → store.save(full map)       │
//! │                                                                         │
//! │  no eviction; saves are serialized, concurrent inserts for one key:    │
//! │  last write wins                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stores
//! - [`JsonFileCacheStore`] - flat JSON object on disk
//! - [`SqliteCacheStore`] - `group_cache` table via billsplit-db
//! - [`MemoryCacheStore`] - in-process only

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use billsplit_core::GroupId;
use billsplit_db::Database;

use crate::error::{LedgerError, LedgerResult};
use crate::ports::CacheStore;

/// Normalizes a group name into its cache key.
pub fn cache_key(group_name: &str) -> String {
    group_name.trim().to_lowercase()
}

// =============================================================================
// GroupIdCache
// =============================================================================

/// Shared, write-through group-id cache.
///
/// Cloning is cheap; all clones see the same entries.
#[derive(Clone)]
pub struct GroupIdCache {
    entries: Arc<RwLock<HashMap<String, GroupId>>>,
    store: Arc<dyn CacheStore>,
    /// Held from snapshot through save, so the store never sees an older
    /// snapshot after a newer one.
    persist: Arc<Mutex<()>>,
}

impl std::fmt::Debug for GroupIdCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupIdCache").finish_non_exhaustive()
    }
}

impl GroupIdCache {
    /// Loads the cache from `store`.
    ///
    /// Keys written by older versions are normalized on load.
    pub async fn load(store: Arc<dyn CacheStore>) -> LedgerResult<Self> {
        let persisted = store.load().await?;
        let entries: HashMap<String, GroupId> = persisted
            .into_iter()
            .map(|(name, id)| (cache_key(&name), id))
            .collect();

        info!(entries = entries.len(), "Group cache loaded");

        Ok(GroupIdCache {
            entries: Arc::new(RwLock::new(entries)),
            store,
            persist: Arc::new(Mutex::new(())),
        })
    }

    /// Looks up a group name, case-insensitively.
    pub async fn get(&self, group_name: &str) -> Option<GroupId> {
        self.entries.read().await.get(&cache_key(group_name)).copied()
    }

    /// Records a resolution and persists the full mapping.
    pub async fn insert(&self, group_name: &str, group_id: GroupId) -> LedgerResult<()> {
        let _persist = self.persist.lock().await;
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.insert(cache_key(group_name), group_id);
            entries.clone()
        };

        debug!(group_name = %group_name, group_id, "Group cache write-through");
        self.store.save(&snapshot).await
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

// =============================================================================
// JSON File Store
// =============================================================================

/// Stores the cache as a flat JSON object: `{"dinner friends": 123456}`.
#[derive(Debug, Clone)]
pub struct JsonFileCacheStore {
    path: PathBuf,
}

impl JsonFileCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileCacheStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CacheStore for JsonFileCacheStore {
    async fn load(&self) -> LedgerResult<HashMap<String, GroupId>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No cache file yet");
                return Ok(HashMap::new());
            }
            Err(e) => return Err(cache_io_error(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            LedgerError::Cache(format!("{} is not a valid cache file: {e}", self.path.display()))
        })
    }

    async fn save(&self, entries: &HashMap<String, GroupId>) -> LedgerResult<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| LedgerError::Cache(e.to_string()))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_file(&path, &json))
            .await
            .map_err(|e| LedgerError::Cache(format!("cache write task failed: {e}")))?
    }
}

/// Writes `contents` to a fresh temp file beside `path`, then renames it
/// over `path`. Every call gets its own temp file.
fn replace_file(path: &Path, contents: &[u8]) -> LedgerResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| cache_io_error(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| cache_io_error(dir, e))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| cache_io_error(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| cache_io_error(path, e.error))?;

    Ok(())
}

fn cache_io_error(path: &Path, err: std::io::Error) -> LedgerError {
    LedgerError::Cache(format!("{}: {err}", path.display()))
}

// =============================================================================
// SQLite Store
// =============================================================================

/// Stores the cache in the `group_cache` table.
#[derive(Debug, Clone)]
pub struct SqliteCacheStore {
    db: Database,
}

impl SqliteCacheStore {
    pub fn new(db: Database) -> Self {
        SqliteCacheStore { db }
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn load(&self) -> LedgerResult<HashMap<String, GroupId>> {
        Ok(self.db.group_cache().load_all().await?)
    }

    async fn save(&self, entries: &HashMap<String, GroupId>) -> LedgerResult<()> {
        Ok(self.db.group_cache().upsert_all(entries).await?)
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// Keeps the "persisted" mapping in memory.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, GroupId>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: HashMap<String, GroupId>) -> Self {
        MemoryCacheStore {
            entries: RwLock::new(entries),
        }
    }

    /// Current persisted mapping.
    pub async fn snapshot(&self) -> HashMap<String, GroupId> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(&self) -> LedgerResult<HashMap<String, GroupId>> {
        Ok(self.snapshot().await)
    }

    async fn save(&self, entries: &HashMap<String, GroupId>) -> LedgerResult<()> {
        *self.entries.write().await = entries.clone();
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use billsplit_db::DbConfig;

    #[tokio::test]
    async fn test_keys_are_case_insensitive() {
        let store = Arc::new(MemoryCacheStore::new());
        let cache = GroupIdCache::load(store.clone()).await.unwrap();

        cache.insert("Dinner Friends", 123456).await.unwrap();

        assert_eq!(cache.get("dinner friends").await, Some(123456));
        assert_eq!(cache.get("DINNER FRIENDS").await, Some(123456));
        assert_eq!(
            store.snapshot().await,
            HashMap::from([("dinner friends".to_string(), 123456)])
        );
    }

    #[tokio::test]
    async fn test_load_normalizes_keys() {
        let store = Arc::new(MemoryCacheStore::with_entries(HashMap::from([(
            "Trip".to_string(),
            42,
        )])));
        let cache = GroupIdCache::load(store).await.unwrap();
        assert_eq!(cache.get("trip").await, Some(42));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let cache = GroupIdCache::load(Arc::new(MemoryCacheStore::new()))
            .await
            .unwrap();
        cache.insert("trip", 1).await.unwrap();
        cache.insert("Trip", 2).await.unwrap();
        assert_eq!(cache.get("trip").await, Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_json_store_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCacheStore::new(dir.path().join("group_cache.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("group_cache.json");
        let store = JsonFileCacheStore::new(&path);

        let entries = HashMap::from([("test".to_string(), 123456)]);
        store.save(&entries).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, serde_json::json!({"test": 123456}));

        assert_eq!(store.load().await.unwrap(), entries);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("group_cache.json")]);
    }

    #[tokio::test]
    async fn test_json_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group_cache.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileCacheStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, LedgerError::Cache(_)));
    }

    /// Stalls the save of a one-entry snapshot so a later insert can
    /// overtake it.
    struct StallingStore {
        inner: MemoryCacheStore,
    }

    #[async_trait]
    impl CacheStore for StallingStore {
        async fn load(&self) -> LedgerResult<HashMap<String, GroupId>> {
            self.inner.load().await
        }

        async fn save(&self, entries: &HashMap<String, GroupId>) -> LedgerResult<()> {
            if entries.len() == 1 {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
            self.inner.save(entries).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_save_is_not_overwritten_by_stale_snapshot() {
        let store = Arc::new(StallingStore {
            inner: MemoryCacheStore::new(),
        });
        let cache = GroupIdCache::load(store.clone()).await.unwrap();

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.insert("alpha", 1).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let second = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.insert("beta", 2).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(
            store.inner.snapshot().await,
            HashMap::from([("alpha".to_string(), 1), ("beta".to_string(), 2)])
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_keep_json_file_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("group_cache.json");
        let store: Arc<dyn CacheStore> = Arc::new(JsonFileCacheStore::new(&path));
        let cache = GroupIdCache::load(store.clone()).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.insert(&format!("group {i}"), i).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let persisted = store.load().await.unwrap();
        assert_eq!(persisted.len(), 50);
        assert_eq!(persisted.get("group 42"), Some(&42));

        let reloaded = GroupIdCache::load(store).await.unwrap();
        assert_eq!(reloaded.len().await, 50);
    }

    #[tokio::test]
    async fn test_sqlite_store_persists() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = Arc::new(SqliteCacheStore::new(db.clone()));

        let cache = GroupIdCache::load(store.clone()).await.unwrap();
        cache.insert("Test", 123456).await.unwrap();

        let reloaded = GroupIdCache::load(store).await.unwrap();
        assert_eq!(reloaded.get("test").await, Some(123456));
        assert_eq!(db.group_cache().get("test").await.unwrap(), Some(123456));
    }
}
