//! In-memory backend for tests and offline development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::models::RemoteDocument;

use super::backend::RemoteBackend;

/// A process-local document store with failure injection.
///
/// `set_online(false)` makes every call fail as unreachable;
/// `set_reject(true)` makes writes fail as rejected. Tests use these to
/// exercise the queue and the error propagation paths without a server.
#[derive(Default)]
pub struct MemoryRemoteBackend {
    docs: Mutex<HashMap<String, RemoteDocument>>,
    offline: AtomicBool,
    reject: AtomicBool,
}

impl MemoryRemoteBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Returns a copy of the stored document, for test assertions.
    pub fn document(&self, owner_id: &str) -> Option<RemoteDocument> {
        self.docs.lock().unwrap().get(owner_id).cloned()
    }

    fn check_online(&self) -> Result<(), SyncError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(SyncError::RemoteUnreachable(
                "simulated network failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteBackend for MemoryRemoteBackend {
    async fn fetch(&self, owner_id: &str) -> Result<Option<RemoteDocument>, SyncError> {
        self.check_online()?;
        Ok(self.docs.lock().unwrap().get(owner_id).cloned())
    }

    async fn store(&self, doc: &RemoteDocument) -> Result<(), SyncError> {
        self.check_online()?;
        if self.reject.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteRejected(
                "simulated permission denial".to_string(),
            ));
        }
        self.docs
            .lock()
            .unwrap()
            .insert(doc.user_id.clone(), doc.clone());
        Ok(())
    }
}
