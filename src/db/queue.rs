//! Durable queue of mutations that could not be applied remotely.
//!
//! Producers only append; an item leaves the queue after a drain confirms
//! its remote apply. Draining is serialized so two concurrent drains cannot
//! replay the same item twice, while `enqueue` stays lock-free (a single
//! INSERT is atomic).

use std::future::Future;

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::SyncError;
use crate::models::{OperationKind, QueueItem};

/// Outcome of one drain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Items confirmed against the remote store and removed.
    pub applied: usize,
    /// Items skipped (corrupt records) or discarded (rejected by the remote).
    pub skipped: usize,
    /// Items still waiting after this run.
    pub remaining: usize,
}

/// The pending operation queue (`sync_queue` table).
pub struct PendingQueue {
    pool: SqlitePool,
    drain_lock: Mutex<()>,
}

impl PendingQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            drain_lock: Mutex::new(()),
        }
    }

    /// Appends an item durably; returns once the insert is committed.
    pub async fn enqueue(&self, item: &QueueItem) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            INSERT INTO sync_queue (id, operation, owner_id, payload, enqueued_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.kind.as_str())
        .bind(&item.owner_id)
        .bind(item.payload.to_string())
        .bind(item.enqueued_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            item_id = %item.id,
            owner_id = %item.owner_id,
            operation = item.kind.as_str(),
            "queued pending operation"
        );

        Ok(())
    }

    /// Number of items waiting, optionally for a single owner.
    pub async fn pending_count(&self, owner_id: Option<&str>) -> Result<usize, SyncError> {
        let (count,): (i64,) = match owner_id {
            Some(owner) => {
                sqlx::query_as("SELECT COUNT(*) FROM sync_queue WHERE owner_id = ?")
                    .bind(owner)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM sync_queue")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count as usize)
    }

    /// Replays queued items in enqueue order through `apply`.
    ///
    /// An item is removed only after `apply` confirms success. An
    /// unreachable remote stops the run with the item retained for a later
    /// drain; a rejected item is discarded (retrying cannot succeed); a
    /// corrupt record is skipped and left in place. At most `batch_size`
    /// items are replayed per call.
    pub async fn drain<F, Fut>(
        &self,
        batch_size: u32,
        owner_id: Option<&str>,
        mut apply: F,
    ) -> Result<DrainReport, SyncError>
    where
        F: FnMut(QueueItem) -> Fut,
        Fut: Future<Output = Result<(), SyncError>>,
    {
        let _guard = self.drain_lock.lock().await;

        let rows = self.fetch_rows(owner_id).await?;

        let mut applied = 0;
        let mut skipped = 0;
        let mut attempted: u32 = 0;

        for row in rows {
            if attempted >= batch_size {
                break;
            }

            let item = match Self::decode_row(&row) {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(raw_id = %row.0, error = %e, "skipping corrupt queue record");
                    skipped += 1;
                    continue;
                }
            };

            attempted += 1;

            match apply(item.clone()).await {
                Ok(()) => {
                    self.remove(item.id).await?;
                    applied += 1;
                }
                Err(SyncError::QueueCorruption(reason)) => {
                    tracing::warn!(item_id = %item.id, %reason, "skipping corrupt queue payload");
                    skipped += 1;
                }
                Err(SyncError::RemoteRejected(reason)) => {
                    // A rejection is permanent; keeping the item would wedge
                    // the queue behind it.
                    tracing::warn!(item_id = %item.id, %reason, "discarding rejected operation");
                    self.remove(item.id).await?;
                    skipped += 1;
                }
                Err(SyncError::RemoteUnreachable(reason)) => {
                    tracing::debug!(item_id = %item.id, %reason, "drain stopped, remote unreachable");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let remaining = self.pending_count(owner_id).await?;

        if applied > 0 || skipped > 0 {
            tracing::info!(applied, skipped, remaining, "drained pending queue");
        }

        Ok(DrainReport {
            applied,
            skipped,
            remaining,
        })
    }

    async fn fetch_rows(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Vec<(String, String, String, String, String)>, SyncError> {
        let rows = match owner_id {
            Some(owner) => {
                sqlx::query_as(
                    r#"
                    SELECT id, operation, owner_id, payload, enqueued_at
                    FROM sync_queue
                    WHERE owner_id = ?
                    ORDER BY enqueued_at ASC, rowid ASC
                    "#,
                )
                .bind(owner)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, operation, owner_id, payload, enqueued_at
                    FROM sync_queue
                    ORDER BY enqueued_at ASC, rowid ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    fn decode_row(
        row: &(String, String, String, String, String),
    ) -> Result<QueueItem, SyncError> {
        let (id, operation, owner_id, payload, enqueued_at) = row;

        let id = Uuid::parse_str(id)
            .map_err(|e| SyncError::QueueCorruption(format!("invalid item id: {}", e)))?;
        let kind = OperationKind::from_str(operation)?;
        let payload = serde_json::from_str(payload)
            .map_err(|e| SyncError::QueueCorruption(format!("invalid payload: {}", e)))?;
        let enqueued_at = chrono::DateTime::parse_from_rfc3339(enqueued_at)
            .map_err(|e| SyncError::QueueCorruption(format!("invalid timestamp: {}", e)))?
            .with_timezone(&chrono::Utc);

        Ok(QueueItem {
            id,
            kind,
            owner_id: owner_id.clone(),
            payload,
            enqueued_at,
        })
    }

    async fn remove(&self, id: Uuid) -> Result<(), SyncError> {
        sqlx::query("DELETE FROM sync_queue WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::models::ListKind;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    async fn setup() -> (PendingQueue, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        (PendingQueue::new(pool), temp_dir)
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_drain_empty_queue_is_a_noop() {
        let (queue, _temp) = setup().await;

        let report = queue
            .drain(50, None, |_item| async { panic!("apply must not run") })
            .await
            .unwrap();

        assert_eq!(
            report,
            DrainReport {
                applied: 0,
                skipped: 0,
                remaining: 0
            }
        );
    }

    #[tokio::test]
    async fn test_drain_applies_in_enqueue_order() {
        let (queue, _temp) = setup().await;

        for recipe in ["a", "b", "c"] {
            queue
                .enqueue(&QueueItem::upsert("user-1", ListKind::Saved, ids(&[recipe])))
                .await
                .unwrap();
        }

        let seen = StdMutex::new(Vec::new());
        let report = queue
            .drain(50, None, |item| {
                seen.lock().unwrap().push(item.id_list().unwrap()[0].clone());
                async { Ok(()) }
            })
            .await
            .unwrap();

        assert_eq!(report.applied, 3);
        assert_eq!(report.remaining, 0);
        assert_eq!(*seen.lock().unwrap(), ids(&["a", "b", "c"]));
        assert_eq!(queue.pending_count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_stops_drain_and_keeps_items() {
        let (queue, _temp) = setup().await;

        for recipe in ["a", "b", "c"] {
            queue
                .enqueue(&QueueItem::upsert("user-1", ListKind::Saved, ids(&[recipe])))
                .await
                .unwrap();
        }

        let calls = StdMutex::new(0usize);
        let report = queue
            .drain(50, None, |_item| {
                let n = {
                    let mut calls = calls.lock().unwrap();
                    *calls += 1;
                    *calls
                };
                async move {
                    if n == 2 {
                        Err(SyncError::RemoteUnreachable("offline".to_string()))
                    } else {
                        Ok(())
                    }
                }
            })
            .await
            .unwrap();

        // First item applied, second failed, third never attempted.
        assert_eq!(report.applied, 1);
        assert_eq!(report.remaining, 2);
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rejected_item_is_discarded_and_drain_continues() {
        let (queue, _temp) = setup().await;

        queue
            .enqueue(&QueueItem::upsert("user-1", ListKind::Saved, ids(&["a"])))
            .await
            .unwrap();
        queue
            .enqueue(&QueueItem::upsert("user-1", ListKind::Saved, ids(&["b"])))
            .await
            .unwrap();

        let report = queue
            .drain(50, None, |item| async move {
                if item.id_list().unwrap()[0] == "a" {
                    Err(SyncError::RemoteRejected("permission denied".to_string()))
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.remaining, 0);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_skipped_not_removed() {
        let (queue, _temp) = setup().await;

        sqlx::query(
            "INSERT INTO sync_queue (id, operation, owner_id, payload, enqueued_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind("garbage_operation")
        .bind("user-1")
        .bind("[]")
        .bind("2025-01-01T00:00:00+00:00")
        .execute(&queue.pool)
        .await
        .unwrap();

        queue
            .enqueue(&QueueItem::upsert("user-1", ListKind::Saved, ids(&["a"])))
            .await
            .unwrap();

        let report = queue.drain(50, None, |_item| async { Ok(()) }).await.unwrap();

        // The good item applied; the corrupt row stays behind.
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.remaining, 1);
    }

    #[tokio::test]
    async fn test_batch_size_limits_replayed_items() {
        let (queue, _temp) = setup().await;

        for recipe in ["a", "b", "c", "d"] {
            queue
                .enqueue(&QueueItem::upsert("user-1", ListKind::Saved, ids(&[recipe])))
                .await
                .unwrap();
        }

        let report = queue.drain(2, None, |_item| async { Ok(()) }).await.unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(report.remaining, 2);
    }

    #[tokio::test]
    async fn test_owner_filter_only_drains_that_owner() {
        let (queue, _temp) = setup().await;

        queue
            .enqueue(&QueueItem::upsert("user-1", ListKind::Saved, ids(&["a"])))
            .await
            .unwrap();
        queue
            .enqueue(&QueueItem::upsert("user-2", ListKind::Saved, ids(&["b"])))
            .await
            .unwrap();

        let report = queue
            .drain(50, Some("user-1"), |item| async move {
                assert_eq!(item.owner_id, "user-1");
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(report.remaining, 0);
        assert_eq!(queue.pending_count(Some("user-2")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_cooking_item_survives_roundtrip() {
        let (queue, _temp) = setup().await;

        queue
            .enqueue(&QueueItem::remove_cooking("user-1", "54_01"))
            .await
            .unwrap();

        let seen = StdMutex::new(Vec::new());
        queue
            .drain(50, None, |item| {
                seen.lock().unwrap().push((item.kind, item.recipe_id().unwrap()));
                async { Ok(()) }
            })
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(OperationKind::RemoveFromCooking, "54_01".to_string())]
        );
    }
}
