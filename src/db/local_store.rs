//! Durable per-owner snapshots of recipe id lists.
//!
//! The local store is always available and never touches the network. It
//! holds the last-known id list for each `(owner, kind)` pair so the UI can
//! read and write without waiting on the remote store.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::SyncError;
use crate::merge::dedup_ids;
use crate::models::ListKind;

/// Local snapshot storage keyed by `(owner_id, kind)`.
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists the snapshot for `(owner, kind)`, replacing any prior value.
    ///
    /// Ids are de-duplicated before writing. The replace is a single SQLite
    /// statement, so a prior snapshot is never left half-overwritten.
    pub async fn write(
        &self,
        owner_id: &str,
        kind: ListKind,
        ids: &[String],
    ) -> Result<(), SyncError> {
        let ids = dedup_ids(ids);
        let json = serde_json::to_string(&ids)
            .map_err(|e| SyncError::LocalPersistence(format!("encode snapshot: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO local_lists (owner_id, kind, recipe_ids, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (owner_id, kind)
            DO UPDATE SET recipe_ids = excluded.recipe_ids,
                          updated_at = excluded.updated_at
            "#,
        )
        .bind(owner_id)
        .bind(kind.as_str())
        .bind(&json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            owner_id,
            kind = kind.as_str(),
            count = ids.len(),
            "wrote local snapshot"
        );

        Ok(())
    }

    /// Returns the last written snapshot, or an empty list if none exists.
    ///
    /// Errors are reported, never swallowed; the caller decides whether a
    /// failed read is served as an empty list.
    pub async fn read(&self, owner_id: &str, kind: ListKind) -> Result<Vec<String>, SyncError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT recipe_ids FROM local_lists WHERE owner_id = ? AND kind = ?",
        )
        .bind(owner_id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((json,)) => serde_json::from_str(&json)
                .map_err(|e| SyncError::LocalPersistence(format!("corrupt snapshot: {}", e))),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn setup() -> (LocalStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        (LocalStore::new(pool), temp_dir)
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_read_missing_returns_empty() {
        let (store, _temp) = setup().await;
        let list = store.read("user-1", ListKind::Saved).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let (store, _temp) = setup().await;

        store
            .write("user-1", ListKind::Saved, &ids(&["a", "b"]))
            .await
            .unwrap();

        let list = store.read("user-1", ListKind::Saved).await.unwrap();
        assert_eq!(list, ids(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_write_replaces_prior_snapshot() {
        let (store, _temp) = setup().await;

        store
            .write("user-1", ListKind::Saved, &ids(&["a", "b"]))
            .await
            .unwrap();
        store
            .write("user-1", ListKind::Saved, &ids(&["c"]))
            .await
            .unwrap();

        let list = store.read("user-1", ListKind::Saved).await.unwrap();
        assert_eq!(list, ids(&["c"]));
    }

    #[tokio::test]
    async fn test_kinds_are_independent() {
        let (store, _temp) = setup().await;

        store
            .write("user-1", ListKind::Saved, &ids(&["a"]))
            .await
            .unwrap();
        store
            .write("user-1", ListKind::Cooking, &ids(&["b"]))
            .await
            .unwrap();

        assert_eq!(
            store.read("user-1", ListKind::Saved).await.unwrap(),
            ids(&["a"])
        );
        assert_eq!(
            store.read("user-1", ListKind::Cooking).await.unwrap(),
            ids(&["b"])
        );
    }

    #[tokio::test]
    async fn test_owners_are_independent() {
        let (store, _temp) = setup().await;

        store
            .write("user-1", ListKind::Saved, &ids(&["a"]))
            .await
            .unwrap();

        let other = store.read("user-2", ListKind::Saved).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_write_dedups_ids() {
        let (store, _temp) = setup().await;

        store
            .write("user-1", ListKind::Saved, &ids(&["a", "a", "b", "a"]))
            .await
            .unwrap();

        let list = store.read("user-1", ListKind::Saved).await.unwrap();
        assert_eq!(list, ids(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let (store, _temp) = setup().await;

        sqlx::query(
            "INSERT INTO local_lists (owner_id, kind, recipe_ids, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind("user-1")
        .bind(ListKind::Saved.as_str())
        .bind("not json")
        .bind(Utc::now().to_rfc3339())
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.read("user-1", ListKind::Saved).await.unwrap_err();
        assert!(matches!(err, SyncError::LocalPersistence(_)));
    }
}
