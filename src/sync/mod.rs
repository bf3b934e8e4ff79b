//! Sync module for offline-first recipe list synchronization.
//!
//! The remote store holds one document per owner with both recipe lists and
//! a monotonically increasing version. Conflicts between devices are not
//! locked out; they are resolved on read by union-merging local and remote
//! snapshots.
//!
//! ## Write path
//!
//! 1. Persist the new snapshot in the local store (never blocks on network)
//! 2. Check reachability
//! 3. Apply remotely (read-modify-write with a version increment), or
//!    append to the durable pending queue when offline
//! 4. A later drain replays queued operations in order
//!
//! ## Read path
//!
//! Fetch local and remote snapshots, union-merge them, write the merged
//! list back to the local store.

mod backend;
mod client;
mod engine;
mod http;
mod memory;

pub use backend::RemoteBackend;
pub use client::RemoteSyncClient;
pub use engine::{SaveOutcome, SyncEngine, SyncReport};
pub use http::HttpRemoteBackend;
pub use memory::MemoryRemoteBackend;
