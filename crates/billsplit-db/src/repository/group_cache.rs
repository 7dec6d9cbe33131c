//! # Group Cache Repository
//!
//! Persists the group-name → group-id cache across restarts.
//!
//! ## Table Layout
//! ```text
//! group_cache
//! ┌──────────────┬──────────┬─────────────────────────┐
//! │ name_key  PK │ group_id │ updated_at (RFC 3339)   │
//! ├──────────────┼──────────┼─────────────────────────┤
//! │ "test"       │ 123456   │ 2024-11-23T10:00:00Z    │
//! └──────────────┴──────────┴─────────────────────────┘
//! ```
//!
//! Keys arrive already normalized (lowercase); the repository stores them
//! as given. Writes are upserts, so the last write for a key wins.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use billsplit_core::GroupId;

/// Repository for the persisted group-id cache.
#[derive(Debug, Clone)]
pub struct GroupCacheRepository {
    pool: SqlitePool,
}

impl GroupCacheRepository {
    /// Creates a new GroupCacheRepository.
    pub fn new(pool: SqlitePool) -> Self {
        GroupCacheRepository { pool }
    }

    /// Loads every cached entry.
    pub async fn load_all(&self) -> DbResult<HashMap<String, GroupId>> {
        let rows = sqlx::query("SELECT name_key, group_id FROM group_cache")
            .fetch_all(&self.pool)
            .await?;

        let mut entries = HashMap::with_capacity(rows.len());
        for row in rows {
            let name_key: String = row.try_get("name_key")?;
            let group_id: i64 = row.try_get("group_id")?;
            entries.insert(name_key, group_id);
        }

        debug!(count = entries.len(), "Loaded group cache");
        Ok(entries)
    }

    /// Gets the cached id for one key.
    pub async fn get(&self, name_key: &str) -> DbResult<Option<GroupId>> {
        let group_id = sqlx::query_scalar::<_, i64>(
            "SELECT group_id FROM group_cache WHERE name_key = ?1",
        )
        .bind(name_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group_id)
    }

    /// Inserts or replaces one entry.
    pub async fn upsert(&self, name_key: &str, group_id: GroupId) -> DbResult<()> {
        debug!(name_key = %name_key, group_id, "Persisting group cache entry");

        sqlx::query(
            r#"
            INSERT INTO group_cache (name_key, group_id, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name_key) DO UPDATE SET
                group_id = excluded.group_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(name_key)
        .bind(group_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upserts every entry in one transaction.
    ///
    /// Stored keys absent from `entries` are left alone.
    pub async fn upsert_all(&self, entries: &HashMap<String, GroupId>) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let now = Utc::now().to_rfc3339();
        for (name_key, group_id) in entries {
            sqlx::query(
                r#"
                INSERT INTO group_cache (name_key, group_id, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(name_key) DO UPDATE SET
                    group_id = excluded.group_id,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(name_key)
            .bind(*group_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(count = entries.len(), "Persisted group cache");
        Ok(())
    }

    /// Counts cached entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_cache")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use std::collections::HashMap;

    async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_cache_loads_empty() {
        let db = database().await;
        let entries = db.group_cache().load_all().await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = database().await;
        let repo = db.group_cache();

        repo.upsert("test", 123456).await.unwrap();
        assert_eq!(repo.get("test").await.unwrap(), Some(123456));
        assert_eq!(repo.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_last_write_wins() {
        let db = database().await;
        let repo = db.group_cache();

        repo.upsert("trip", 1).await.unwrap();
        repo.upsert("trip", 2).await.unwrap();

        assert_eq!(repo.get("trip").await.unwrap(), Some(2));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_all() {
        let db = database().await;
        let repo = db.group_cache();
        repo.upsert("kept", 9).await.unwrap();
        repo.upsert("trip", 1).await.unwrap();

        let entries = HashMap::from([("test".to_string(), 123456), ("trip".to_string(), 42)]);
        repo.upsert_all(&entries).await.unwrap();

        let stored = repo.load_all().await.unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored["kept"], 9);
        assert_eq!(stored["trip"], 42);
        assert_eq!(stored["test"], 123456);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        db.group_cache().upsert("test", 123456).await.unwrap();
        db.close().await;

        let reopened = Database::new(DbConfig::new(&path)).await.unwrap();
        assert_eq!(
            reopened.group_cache().get("test").await.unwrap(),
            Some(123456)
        );
    }
}
