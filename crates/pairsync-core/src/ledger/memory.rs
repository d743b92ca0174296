use std::sync::{Mutex, PoisonError};

use super::{ConflictLedger, ConflictMap, ConflictRecord};
use crate::Result;
use crate::pair::PairKey;

/// In-memory ledger for tests.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Mutex<ConflictMap>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConflictLedger for MemoryLedger {
    fn put(&self, key: &PairKey, record: ConflictRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.insert(key.clone(), record);
        Ok(())
    }

    fn remove(&self, key: &PairKey) -> Result<bool> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.remove(key).is_some())
    }

    fn get_all(&self) -> Result<ConflictMap> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.clone())
    }
}
