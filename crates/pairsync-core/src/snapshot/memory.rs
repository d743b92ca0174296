use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::SnapshotStore;
use crate::Result;
use crate::pair::PairKey;

/// In-memory snapshot store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<PairKey, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, key: &PairKey) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &PairKey, content: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.clone(), content.to_string());
        Ok(())
    }
}
