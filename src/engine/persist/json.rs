//! JSON-backed snapshot store.
//!
//! All keys live in one file (`{ "snapshots": { key: snapshot, ... } }`). The
//! file is read once on open and kept in memory; every mutation rewrites the
//! whole file through a temporary sibling that is renamed into place.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use super::SnapshotStore;
use crate::engine::snapshot::CanvasSnapshot;

/// On-disk representation of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    snapshots: BTreeMap<String, CanvasSnapshot>,
}

pub struct JsonSnapshotStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, CanvasSnapshot>>,
}

impl JsonSnapshotStore {
    /// Opens the store at `path`, creating an empty file if none exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let file = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading snapshot store {}", path.display()))?;
            serde_json::from_str::<SnapshotFile>(&contents)
                .with_context(|| format!("parsing snapshot store {}", path.display()))?
        } else {
            let file = SnapshotFile::default();
            write_file(&path, &file)?;
            file
        };

        log::debug!(
            "JsonSnapshotStore: opened {} with {} entries",
            path.display(),
            file.snapshots.len()
        );
        Ok(Self {
            path,
            entries: RwLock::new(file.snapshots),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `entries` to disk and hands them back for committing.
    fn flush(
        &self,
        entries: BTreeMap<String, CanvasSnapshot>,
    ) -> Result<BTreeMap<String, CanvasSnapshot>> {
        let file = SnapshotFile { snapshots: entries };
        write_file(&self.path, &file)?;
        Ok(file.snapshots)
    }
}

fn write_file(path: &Path, file: &SnapshotFile) -> Result<()> {
    let contents = serde_json::to_string_pretty(file)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

impl SnapshotStore for JsonSnapshotStore {
    fn put(&self, key: &str, snapshot: &CanvasSnapshot) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?;
        let mut next = entries.clone();
        next.insert(key.to_string(), snapshot.clone());
        *entries = self.flush(next)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<CanvasSnapshot>> {
        let entries = self.entries.read().map_err(|_| anyhow!("snapshot store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?;
        if entries.contains_key(key) {
            let mut next = entries.clone();
            next.remove(key);
            *entries = self.flush(next)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| anyhow!("snapshot store lock poisoned"))?;
        Ok(entries.keys().cloned().collect())
    }
}
