use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use super::SnapshotStore;
use crate::engine::snapshot::CanvasSnapshot;

#[derive(Default)]
pub struct InMemorySnapshotStore {
    entries: RwLock<BTreeMap<String, CanvasSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn put(&self, key: &str, snapshot: &CanvasSnapshot) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?
            .insert(key.to_string(), snapshot.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<CanvasSnapshot>> {
        Ok(self
            .entries
            .read()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?
            .get(key)
            .cloned())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?
            .remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .entries
            .read()
            .map_err(|_| anyhow!("snapshot store lock poisoned"))?
            .keys()
            .cloned()
            .collect())
    }
}
