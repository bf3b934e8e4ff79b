//! Engine error types.

use thiserror::Error;

/// Errors that can occur in the sync engine.
///
/// `RemoteUnreachable` is expected whenever the device is offline and is
/// absorbed by the engine's mutation and read paths (the operation is queued
/// or served from the local snapshot). The other variants indicate a real
/// defect and propagate to the caller.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Local storage is unavailable or the stored snapshot is corrupted.
    #[error("local persistence failure: {0}")]
    LocalPersistence(String),

    /// The remote store could not be reached, or the call timed out.
    #[error("remote unreachable: {0}")]
    RemoteUnreachable(String),

    /// The remote store rejected the request (e.g. permission denied).
    /// Retrying will not succeed.
    #[error("remote rejected: {0}")]
    RemoteRejected(String),

    /// A queue record could not be decoded.
    #[error("queue corruption: {0}")]
    QueueCorruption(String),
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::LocalPersistence(e.to_string())
    }
}

impl SyncError {
    /// True for failures that are expected under offline operation and
    /// recovered by queueing rather than surfaced to the caller.
    pub fn is_offline(&self) -> bool {
        matches!(self, SyncError::RemoteUnreachable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_reason() {
        let err = SyncError::RemoteRejected("permission denied".to_string());
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_is_offline() {
        assert!(SyncError::RemoteUnreachable("no route".to_string()).is_offline());
        assert!(!SyncError::RemoteRejected("denied".to_string()).is_offline());
        assert!(!SyncError::LocalPersistence("disk full".to_string()).is_offline());
    }
}
