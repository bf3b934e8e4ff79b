//! The sync engine: local-first mutations, opportunistic remote applies,
//! durable queueing, and merge-on-read reconciliation.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::SyncConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::db::{init_db, DrainReport, LocalStore, PendingQueue};
use crate::error::SyncError;
use crate::merge::merge_id_lists;
use crate::models::{ListKind, OperationKind, QueueItem};

use super::backend::RemoteBackend;
use super::client::RemoteSyncClient;

/// Terminal success states for a mutating call.
///
/// Both mean the caller's write is safe: `Queued` additionally schedules a
/// later remote apply via drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The change reached the remote store.
    RemoteApplied,
    /// The change is durably queued for a later drain.
    Queued,
}

/// Result of a force-sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub drain: DrainReport,
    pub saved: Vec<String>,
    pub cooking: Vec<String>,
}

/// Offline-first synchronization engine for per-owner recipe lists.
///
/// Construct once per process and share by reference; all methods take
/// `&self` and tolerate concurrent callers.
pub struct SyncEngine {
    local: LocalStore,
    queue: PendingQueue,
    remote: RemoteSyncClient,
    connectivity: Arc<dyn ConnectivityMonitor>,
    config: SyncConfig,
}

impl SyncEngine {
    /// Opens (or creates) the local database and assembles the engine.
    pub async fn new(
        config: SyncConfig,
        backend: Arc<dyn RemoteBackend>,
        connectivity: Arc<dyn ConnectivityMonitor>,
    ) -> Result<Self, SyncError> {
        let pool = init_db(&config.database_path).await?;
        Ok(Self::with_pool(pool, config, backend, connectivity))
    }

    /// Assembles the engine over an existing pool. Lets tests substitute an
    /// isolated database per case.
    pub fn with_pool(
        pool: SqlitePool,
        config: SyncConfig,
        backend: Arc<dyn RemoteBackend>,
        connectivity: Arc<dyn ConnectivityMonitor>,
    ) -> Self {
        let remote = RemoteSyncClient::new(backend, config.remote_timeout());
        Self {
            local: LocalStore::new(pool.clone()),
            queue: PendingQueue::new(pool),
            remote,
            connectivity,
            config,
        }
    }

    /// Replaces the full id list for `(owner, kind)`.
    ///
    /// The local snapshot is durable before any network traffic; an offline
    /// or failed remote apply is queued and still reported as success.
    pub async fn replace_list(
        &self,
        owner_id: &str,
        kind: ListKind,
        ids: Vec<String>,
    ) -> Result<SaveOutcome, SyncError> {
        self.local.write(owner_id, kind, &ids).await?;
        self.apply_or_enqueue(QueueItem::upsert(owner_id, kind, ids))
            .await
    }

    /// Adds one id to `(owner, kind)`. Adding an id that is already present
    /// re-syncs the unchanged list.
    pub async fn add_to_list(
        &self,
        owner_id: &str,
        kind: ListKind,
        recipe_id: &str,
    ) -> Result<SaveOutcome, SyncError> {
        let mut ids = self.read_local(owner_id, kind).await;
        if !ids.iter().any(|id| id == recipe_id) {
            ids.push(recipe_id.to_string());
        }
        self.replace_list(owner_id, kind, ids).await
    }

    /// Removes one id from `(owner, kind)`.
    ///
    /// Cooking removals are applied remotely as a targeted filter of the
    /// cooking field; saved removals re-upsert the filtered list. Removal is
    /// not tombstoned: a device still holding the old snapshot can
    /// resurrect the id through a later union-merge.
    pub async fn remove_from_list(
        &self,
        owner_id: &str,
        kind: ListKind,
        recipe_id: &str,
    ) -> Result<SaveOutcome, SyncError> {
        let ids: Vec<String> = self
            .read_local(owner_id, kind)
            .await
            .into_iter()
            .filter(|id| id != recipe_id)
            .collect();
        self.local.write(owner_id, kind, &ids).await?;

        let item = match kind {
            ListKind::Cooking => QueueItem::remove_cooking(owner_id, recipe_id),
            ListKind::Saved => QueueItem::upsert(owner_id, ListKind::Saved, ids),
        };
        self.apply_or_enqueue(item).await
    }

    /// Returns the reconciled list for `(owner, kind)`.
    ///
    /// Local and remote snapshots are union-merged (or the remote snapshot
    /// wins when `merge_on_read` is off) and the result is written back to
    /// the local store. An unreachable remote serves the local snapshot.
    pub async fn list(&self, owner_id: &str, kind: ListKind) -> Result<Vec<String>, SyncError> {
        let local = self.read_local(owner_id, kind).await;

        let (remote, _version) = match self.remote.fetch_list(owner_id, kind).await {
            Ok(result) => result,
            Err(SyncError::RemoteUnreachable(reason)) => {
                tracing::debug!(owner_id, %reason, "remote unavailable on read, serving local");
                return Ok(local);
            }
            Err(e) => return Err(e),
        };

        let merged = if self.config.merge_on_read {
            merge_id_lists(&local, &remote)
        } else {
            remote
        };

        self.local.write(owner_id, kind, &merged).await?;
        Ok(merged)
    }

    /// Replays queued operations. This is the entry point a reconnect
    /// listener calls when connectivity returns.
    pub async fn drain_now(&self) -> Result<DrainReport, SyncError> {
        self.queue
            .drain(self.config.queue_drain_batch_size, None, |item| {
                self.apply_remote(item)
            })
            .await
    }

    /// Drains the queue, then reconciles both lists for an owner.
    pub async fn sync_now(&self, owner_id: &str) -> Result<SyncReport, SyncError> {
        let drain = self.drain_now().await?;
        let saved = self.list(owner_id, ListKind::Saved).await?;
        let cooking = self.list(owner_id, ListKind::Cooking).await?;
        Ok(SyncReport {
            drain,
            saved,
            cooking,
        })
    }

    /// Reads the local snapshot, serving a failed read as an empty list
    /// (never as a deletion) so display paths keep working.
    async fn read_local(&self, owner_id: &str, kind: ListKind) -> Vec<String> {
        match self.local.read(owner_id, kind).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(
                    owner_id,
                    kind = kind.as_str(),
                    error = %e,
                    "local read failed, serving empty list"
                );
                Vec::new()
            }
        }
    }

    /// Applies an operation remotely, or queues it when the remote store is
    /// out of reach.
    async fn apply_or_enqueue(&self, item: QueueItem) -> Result<SaveOutcome, SyncError> {
        if !self.connectivity.is_reachable().await {
            self.queue.enqueue(&item).await?;
            return Ok(SaveOutcome::Queued);
        }

        // Replay this owner's older items first so per-owner order holds.
        let report = self
            .queue
            .drain(
                self.config.queue_drain_batch_size,
                Some(&item.owner_id),
                |queued| self.apply_remote(queued),
            )
            .await?;
        if report.remaining > 0 {
            // Older operations are still pending; queue behind them.
            self.queue.enqueue(&item).await?;
            return Ok(SaveOutcome::Queued);
        }

        match self.apply_remote(item.clone()).await {
            Ok(()) => Ok(SaveOutcome::RemoteApplied),
            Err(SyncError::RemoteUnreachable(reason)) => {
                tracing::debug!(owner_id = %item.owner_id, %reason, "remote apply failed, queueing");
                self.queue.enqueue(&item).await?;
                Ok(SaveOutcome::Queued)
            }
            Err(e) => Err(e),
        }
    }

    /// Maps a queue item onto the remote client.
    async fn apply_remote(&self, item: QueueItem) -> Result<(), SyncError> {
        match item.kind {
            OperationKind::UpsertSavedList | OperationKind::UpsertCookingList => {
                let ids = item.id_list()?;
                self.remote
                    .upsert_list(&item.owner_id, item.kind.list_kind(), &ids)
                    .await?;
            }
            OperationKind::RemoveFromCooking => {
                let recipe_id = item.recipe_id()?;
                self.remote
                    .remove_from_list(&item.owner_id, ListKind::Cooking, &recipe_id)
                    .await?;
            }
        }
        Ok(())
    }
}
