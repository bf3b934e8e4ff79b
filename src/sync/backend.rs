//! Transport seam to the authoritative per-owner document store.

use async_trait::async_trait;

use crate::error::SyncError;
use crate::models::RemoteDocument;

/// Raw document access against the remote store.
///
/// The engine only needs whole-document reads and writes; version
/// bookkeeping and partial-field merges live in `RemoteSyncClient` on top
/// of this trait, so backends stay trivial and tests can substitute an
/// in-memory one.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Fetches the document for an owner, or `None` if it does not exist.
    async fn fetch(&self, owner_id: &str) -> Result<Option<RemoteDocument>, SyncError>;

    /// Stores the full document, creating or replacing it.
    async fn store(&self, doc: &RemoteDocument) -> Result<(), SyncError>;
}
