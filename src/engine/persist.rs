//! Snapshot persistence.
//!
//! Persistence is a bus subscriber like any other: the session publishes
//! `save`, and an [`AutosaveWorker`] picks the event up on a tokio task and
//! writes the session's current snapshot to a [`SnapshotStore`]. The session
//! never waits on the store.
//!
//! Two stores are provided:
//!
//! - [`InMemorySnapshotStore`]: keeps snapshots in a map (tests, private sessions).
//! - [`JsonSnapshotStore`]: one JSON file holding every key.
//!
//! Keys are free-form; the autosave worker uses the session's backend kind,
//! which is unique per registry.

mod autosave;
mod in_memory;
mod json;

use anyhow::Result;

use crate::engine::snapshot::CanvasSnapshot;

pub use autosave::AutosaveWorker;
pub use in_memory::InMemorySnapshotStore;
pub use json::JsonSnapshotStore;

/// Keyed storage for canvas snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Stores `snapshot` under `key`, replacing what was there.
    fn put(&self, key: &str, snapshot: &CanvasSnapshot) -> Result<()>;

    /// Returns the snapshot stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<CanvasSnapshot>>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}
