//! Sync coordination layer for pairsync
//!
//! Keeps pairs of files in two locations consistent while both sides are
//! edited independently. On every change the [`Coordinator`] decides between
//! a plain copy, an automatic three-way merge and a conflict that needs a
//! human:
//!
//! ```text
//!   change event
//!        |
//!   Coordinator --- PairLocks (re-entrancy guard + cooldown)
//!        |
//!   +----+-----------+--------------+
//!   |                |              |
//! SnapshotStore  ConflictLedger  pairsync-merge
//! ```
//!
//! The snapshot store, the ledger and the conflict notifier are traits, so
//! tests can substitute in-memory versions.

pub mod config;
pub mod coordinator;
pub mod daemon;
pub mod error;
pub mod ledger;
pub mod lock;
pub mod notify;
pub mod pair;
pub mod snapshot;

pub use config::{ConflictBasePolicy, PairEntry, Settings, SyncConfig};
pub use coordinator::{
    Coordinator, CopyDirection, PairReport, PairState, PairStatus, Resolution, SyncOutcome,
};
pub use daemon::{Daemon, DaemonEvent};
pub use error::{Error, Result};
pub use ledger::{
    ConflictEntry, ConflictLedger, ConflictMap, ConflictRecord, JsonLedger, MemoryLedger,
};
pub use lock::{
    Clock, LockAttempt, LockRecord, ManualClock, PairLockGuard, PairLocks, SystemClock,
};
pub use notify::{ConflictNotice, ConflictNotifier, LogNotifier};
pub use pair::{PairKey, PairMap, PairMatch, SyncPair};
pub use snapshot::{FsSnapshotStore, MemorySnapshotStore, SnapshotStore};
