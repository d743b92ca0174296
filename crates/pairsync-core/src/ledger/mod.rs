//! Conflict ledger
//!
//! The ledger holds one record per pair currently in an unresolved conflict.
//! It is written only by the coordinator and read by anything that wants to
//! show conflicts to a user. The whole structure is read-modify-written on
//! every mutation.

mod file;
mod memory;

pub use file::JsonLedger;
pub use memory::MemoryLedger;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pairsync_fs::NormalizedPath;
use pairsync_merge::Conflict;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::pair::PairKey;

/// Every active record, keyed by pair.
pub type ConflictMap = BTreeMap<PairKey, ConflictRecord>;

/// One conflicting region, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEntry {
    /// 1-based line in the base where the region starts
    pub line: usize,
    pub base: Vec<String>,
    pub source: Vec<String>,
    pub target: Vec<String>,
}

impl From<&Conflict> for ConflictEntry {
    fn from(conflict: &Conflict) -> Self {
        Self {
            line: conflict.line_number,
            base: conflict.base_lines.clone(),
            source: conflict.source_lines.clone(),
            target: conflict.target_lines.clone(),
        }
    }
}

impl From<&ConflictEntry> for Conflict {
    fn from(entry: &ConflictEntry) -> Self {
        Self {
            line_number: entry.line,
            base_lines: entry.base.clone(),
            source_lines: entry.source.clone(),
            target_lines: entry.target.clone(),
        }
    }
}

/// The active conflict of a pair.
///
/// `source` is the side whose change produced the conflict, `target` its
/// partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub source: String,
    pub target: String,
    pub conflict_count: usize,
    pub conflicts: Vec<ConflictEntry>,
    pub timestamp: DateTime<Utc>,
}

impl ConflictRecord {
    pub fn new(
        source: &NormalizedPath,
        target: &NormalizedPath,
        conflicts: &[Conflict],
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            source: source.as_str().to_string(),
            target: target.as_str().to_string(),
            conflict_count: conflicts.len(),
            conflicts: conflicts.iter().map(ConflictEntry::from).collect(),
            timestamp,
        }
    }
}

/// Persistence of conflict records.
pub trait ConflictLedger: Send + Sync {
    /// Insert or replace the record of `key`.
    fn put(&self, key: &PairKey, record: ConflictRecord) -> Result<()>;

    /// Remove the record of `key`. Returns whether one existed.
    fn remove(&self, key: &PairKey) -> Result<bool>;

    fn get_all(&self) -> Result<ConflictMap>;

    fn get(&self, key: &PairKey) -> Result<Option<ConflictRecord>> {
        Ok(self.get_all()?.remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_conflicts() {
        let conflict = Conflict {
            line_number: 3,
            base_lines: vec!["a\n".into()],
            source_lines: vec!["b\n".into()],
            target_lines: vec!["c\n".into()],
        };
        let record = ConflictRecord::new(
            &"/x/f.md".into(),
            &"/y/f.md".into(),
            std::slice::from_ref(&conflict),
            Utc::now(),
        );

        assert_eq!(record.conflict_count, 1);
        assert_eq!(record.conflicts[0].line, 3);
        assert_eq!(Conflict::from(&record.conflicts[0]), conflict);
    }

    #[test]
    fn record_serializes_with_flat_field_names() {
        let record = ConflictRecord::new(&"/x".into(), &"/y".into(), &[], Utc::now());
        let value = serde_json::to_value(&record).unwrap();

        for field in ["source", "target", "conflict_count", "conflicts", "timestamp"] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }
}
