//! Read-only view of a pair's state

use std::fmt;

use pairsync_fs::io;

use super::Coordinator;
use crate::Result;
use crate::pair::SyncPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    InSync,
    Differs,
    SourceMissing,
    TargetMissing,
    BothMissing,
    /// A conflict record is active
    Conflicted,
}

impl PairState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InSync => "in_sync",
            Self::Differs => "differs",
            Self::SourceMissing => "source_missing",
            Self::TargetMissing => "target_missing",
            Self::BothMissing => "both_missing",
            Self::Conflicted => "conflicted",
        }
    }
}

impl fmt::Display for PairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().replace('_', " "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairStatus {
    pub state: PairState,
    pub has_base: bool,
}

impl Coordinator {
    /// Inspect `pair` without writing anything.
    pub fn status(&self, pair: &SyncPair) -> Result<PairStatus> {
        let key = pair.key();
        let has_base = self.snapshots.contains(&key)?;

        let state = if self.ledger.get(&key)?.is_some() {
            PairState::Conflicted
        } else {
            match (pair.source.exists(), pair.target.exists()) {
                (false, false) => PairState::BothMissing,
                (false, true) => PairState::SourceMissing,
                (true, false) => PairState::TargetMissing,
                (true, true) => {
                    if io::read_bytes(&pair.source)? == io::read_bytes(&pair.target)? {
                        PairState::InSync
                    } else {
                        PairState::Differs
                    }
                }
            }
        };

        Ok(PairStatus { state, has_base })
    }
}
