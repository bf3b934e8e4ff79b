//! CookSync Core Library
//!
//! Offline-first synchronization engine for per-user recipe lists.
//!
//! Keeps the saved and currently-cooking recipe id lists consistent between
//! a local on-device cache and the remote authoritative store, under
//! intermittent connectivity, without losing writes made while offline.
//! Mutations always land locally first; reads reconcile local and remote
//! snapshots by union-merge.

pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod merge;
pub mod models;
pub mod sync;

pub use config::{ConfigError, SyncConfig};
pub use connectivity::{ConnectivityMonitor, HttpConnectivityMonitor, StaticConnectivity};
pub use db::{init_db, DrainReport, LocalStore, PendingQueue};
pub use error::SyncError;
pub use merge::merge_id_lists;
pub use models::{ListKind, OperationKind, QueueItem, RemoteDocument};
pub use sync::{
    HttpRemoteBackend, MemoryRemoteBackend, RemoteBackend, RemoteSyncClient, SaveOutcome,
    SyncEngine, SyncReport,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
