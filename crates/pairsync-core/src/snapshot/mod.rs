//! Base snapshot storage
//!
//! A base snapshot is the full text both sides of a pair last agreed on. One
//! entry per pair, keyed by [`PairKey`], overwritten on every reconciliation
//! and never deleted. Binary pairs have no snapshot.

mod fs;
mod memory;

pub use fs::FsSnapshotStore;
pub use memory::MemorySnapshotStore;

use crate::Result;
use crate::pair::PairKey;

/// Key/value persistence of base snapshots.
pub trait SnapshotStore: Send + Sync {
    /// The last agreed content, or `None` if the pair was never reconciled.
    fn load(&self, key: &PairKey) -> Result<Option<String>>;

    fn save(&self, key: &PairKey, content: &str) -> Result<()>;

    fn contains(&self, key: &PairKey) -> Result<bool> {
        Ok(self.load(key)?.is_some())
    }
}
