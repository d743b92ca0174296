//! Sync coordinator
//!
//! Turns "this path changed" into file writes. For a tracked path the
//! coordinator takes the pair lock of the path and classifies the situation,
//! first match wins:
//!
//! 1. an active conflict record: check whether the markers are gone
//! 2. the changed file is missing: nothing to do
//! 3. the partner is missing: copy the changed file over
//! 4. binary content: the newer file is copied over the older one
//! 5. identical content: nothing to do
//! 6. no base snapshot: the newer file wins and seeds the base
//! 7. one side equals the base: the other side is copied over it
//! 8. both changed: three-way merge, writing the result (or the conflict
//!    markers) to both sides
//!
//! No path blocks: a locked path or one in its cooldown is skipped.

mod outcome;
mod resolution;
mod status;

pub use outcome::{CopyDirection, Resolution, SyncOutcome};
pub use status::{PairState, PairStatus};

use std::cmp::Ordering;
use std::sync::Arc;

use pairsync_fs::{NormalizedPath, SyncLayout, TextClassifier, io};
use pairsync_merge::{Side, has_conflict_markers, three_way_merge};
use tracing::{debug, error, info, warn};

use crate::config::{ConflictBasePolicy, SyncConfig};
use crate::ledger::{ConflictLedger, ConflictRecord, JsonLedger};
use crate::lock::{Clock, LockAttempt, PairLockGuard, PairLocks};
use crate::notify::{ConflictNotice, ConflictNotifier, LogNotifier};
use crate::pair::{PairKey, PairMap, PairMatch, SyncPair};
use crate::snapshot::{FsSnapshotStore, SnapshotStore};
use crate::{Error, Result};

/// What started a sync of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Event,
    Startup,
}

/// Result of reconciling one pair during [`Coordinator::initial_sync`].
#[derive(Debug)]
pub struct PairReport {
    pub pair: SyncPair,
    pub result: Result<SyncOutcome>,
}

/// The sync engine. Stores, locks and the notifier are injected.
pub struct Coordinator {
    pairs: PairMap,
    snapshots: Arc<dyn SnapshotStore>,
    ledger: Arc<dyn ConflictLedger>,
    locks: PairLocks,
    notifier: Arc<dyn ConflictNotifier>,
    classifier: TextClassifier,
    conflict_base: ConflictBasePolicy,
    clock: Arc<dyn Clock>,
}

impl Coordinator {
    /// Create a coordinator with a log notifier, the default classifier and
    /// the lock manager's clock.
    pub fn new(
        pairs: PairMap,
        snapshots: Arc<dyn SnapshotStore>,
        ledger: Arc<dyn ConflictLedger>,
        locks: PairLocks,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pairs,
            snapshots,
            ledger,
            locks,
            notifier: Arc::new(LogNotifier),
            classifier: TextClassifier::default(),
            conflict_base: ConflictBasePolicy::default(),
            clock,
        }
    }

    /// Coordinator backed by the files of `layout`, configured by `config`.
    pub fn from_layout(
        layout: &SyncLayout,
        config: &SyncConfig,
        notifier: Arc<dyn ConflictNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = &config.settings;
        let locks = PairLocks::new(layout.locks_dir(), Arc::clone(&clock))
            .with_cooldown(settings.cooldown())
            .with_stale_after(settings.stale_after());

        Self::new(
            PairMap::new(config.sync_pairs()),
            Arc::new(FsSnapshotStore::new(layout.bases_dir())),
            Arc::new(JsonLedger::new(layout.conflicts_file())),
            locks,
            clock,
        )
        .with_notifier(notifier)
        .with_classifier(settings.classifier())
        .with_conflict_base(settings.conflict_base)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ConflictNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_classifier(mut self, classifier: TextClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_conflict_base(mut self, policy: ConflictBasePolicy) -> Self {
        self.conflict_base = policy;
        self
    }

    pub fn pairs(&self) -> &PairMap {
        &self.pairs
    }

    pub fn snapshots(&self) -> &dyn SnapshotStore {
        self.snapshots.as_ref()
    }

    pub fn ledger(&self) -> &dyn ConflictLedger {
        self.ledger.as_ref()
    }

    pub fn locks(&self) -> &PairLocks {
        &self.locks
    }

    /// Handle a change event for `path`.
    pub fn on_change(&self, path: &NormalizedPath) -> Result<SyncOutcome> {
        let Some(PairMatch {
            pair,
            changed,
            partner,
        }) = self.pairs.lookup(path)
        else {
            debug!(path = %path, "Ignoring untracked path");
            return Ok(SyncOutcome::Untracked);
        };

        let _guard = match self.try_lock(changed)? {
            Ok(guard) => guard,
            Err(outcome) => return Ok(outcome),
        };

        let key = pair.key();
        if let Some(outcome) = self.resolve_if_conflicted(pair, &key, changed, partner)? {
            return Ok(outcome);
        }

        if !changed.exists() {
            info!(pair = %pair.name, path = %changed, "Source missing, nothing to sync");
            return Ok(SyncOutcome::SourceMissing);
        }
        if !partner.exists() {
            return self.create_missing(pair, &key, changed, partner, CopyDirection::ToPartner);
        }

        self.sync_present(pair, &key, changed, partner, Trigger::Event)
    }

    /// Startup reconciliation of one pair, with the configured source as the
    /// changed side.
    pub fn reconcile(&self, pair: &SyncPair) -> Result<SyncOutcome> {
        let (source, target) = (&pair.source, &pair.target);
        let _guard = match self.try_lock(source)? {
            Ok(guard) => guard,
            Err(outcome) => return Ok(outcome),
        };

        let key = pair.key();
        if let Some(outcome) = self.resolve_if_conflicted(pair, &key, source, target)? {
            return Ok(outcome);
        }

        match (source.exists(), target.exists()) {
            (false, false) => {
                warn!(pair = %pair.name, "Both files missing");
                Ok(SyncOutcome::BothMissing)
            }
            (true, false) => {
                self.create_missing(pair, &key, source, target, CopyDirection::ToPartner)
            }
            (false, true) => {
                self.create_missing(pair, &key, target, source, CopyDirection::FromPartner)
            }
            (true, true) => self.sync_present(pair, &key, source, target, Trigger::Startup),
        }
    }

    /// Reconcile every pair. A failing pair is logged and does not stop the
    /// others.
    pub fn initial_sync(&self) -> Vec<PairReport> {
        self.pairs
            .pairs()
            .iter()
            .map(|pair| {
                let result = self.reconcile(pair);
                if let Err(e) = &result {
                    error!(pair = %pair.name, error = %e, "Initial sync failed");
                }
                PairReport {
                    pair: pair.clone(),
                    result,
                }
            })
            .collect()
    }

    /// Resolve an active conflict by keeping the `side` half of every marker
    /// block. The result is written to both files and becomes the new base.
    pub fn resolve_with(&self, pair: &SyncPair, side: Side) -> Result<SyncOutcome> {
        let key = pair.key();
        if self.ledger.get(&key)?.is_none() {
            return Err(Error::NotInConflict(pair.name.clone()));
        }

        let _guard = match self.locks.try_acquire(&pair.source)? {
            LockAttempt::Acquired(guard) => Some(guard),
            LockAttempt::CoolingDown { .. } => None,
            LockAttempt::Held { owner_pid } => {
                return Err(Error::lock(
                    pair.source.to_native(),
                    format!("held by process {owner_pid}"),
                ));
            }
        };

        let conflicted = [
            read_existing_text(&pair.source)?,
            read_existing_text(&pair.target)?,
        ]
        .into_iter()
        .flatten()
        .find(|content| has_conflict_markers(content));

        let Some(conflicted) = conflicted else {
            // Markers already removed by hand; settle it the automatic way.
            return self
                .check_resolution(pair, &key, &pair.source, &pair.target)?
                .ok_or_else(|| Error::Ledger {
                    message: format!("conflicted files of '{}' are unreadable", pair.name),
                });
        };

        let resolved = pairsync_merge::resolve_with(&conflicted, side);
        io::write_text(&pair.source, &resolved)?;
        io::write_text(&pair.target, &resolved)?;
        self.snapshots.save(&key, &resolved)?;
        self.ledger.remove(&key)?;

        let resolution = Resolution::Taken(side);
        info!(pair = %pair.name, %resolution, "Conflict resolved manually");
        Ok(SyncOutcome::ConflictResolved(resolution))
    }

    /// Take the pair lock of `path`, or the outcome explaining why not.
    fn try_lock(
        &self,
        path: &NormalizedPath,
    ) -> Result<std::result::Result<PairLockGuard, SyncOutcome>> {
        Ok(match self.locks.try_acquire(path)? {
            LockAttempt::Acquired(guard) => Ok(guard),
            LockAttempt::Held { owner_pid } => {
                debug!(path = %path, owner_pid, "Pair lock held, dropping event");
                Err(SyncOutcome::Locked { owner_pid })
            }
            LockAttempt::CoolingDown { .. } => {
                debug!(path = %path, "Pair in cooldown, dropping event");
                Err(SyncOutcome::CoolingDown)
            }
        })
    }

    fn resolve_if_conflicted(
        &self,
        pair: &SyncPair,
        key: &PairKey,
        changed: &NormalizedPath,
        partner: &NormalizedPath,
    ) -> Result<Option<SyncOutcome>> {
        if self.ledger.get(key)?.is_none() {
            return Ok(None);
        }
        self.check_resolution(pair, key, changed, partner)
    }

    /// Copy `from` to the missing `to`, seeding the base for text files.
    fn create_missing(
        &self,
        pair: &SyncPair,
        key: &PairKey,
        from: &NormalizedPath,
        to: &NormalizedPath,
        direction: CopyDirection,
    ) -> Result<SyncOutcome> {
        io::copy_preserving(from, to)?;
        if self.classifier.is_text(from)
            && let Some(content) = read_if_text(from)?
        {
            self.snapshots.save(key, &content)?;
        }
        info!(pair = %pair.name, from = %from, to = %to, "Created missing side");
        Ok(SyncOutcome::Created(direction))
    }

    /// Both sides exist: steps 4 to 8.
    fn sync_present(
        &self,
        pair: &SyncPair,
        key: &PairKey,
        changed: &NormalizedPath,
        partner: &NormalizedPath,
        trigger: Trigger,
    ) -> Result<SyncOutcome> {
        let texts = if self.classifier.is_text(changed) {
            match (read_if_text(changed)?, read_if_text(partner)?) {
                (Some(ours), Some(theirs)) => Some((ours, theirs)),
                _ => {
                    debug!(pair = %pair.name, "Content is not valid UTF-8, treating as binary");
                    None
                }
            }
        } else {
            None
        };
        let Some((ours, theirs)) = texts else {
            return self.sync_binary(pair, changed, partner);
        };

        if ours == theirs {
            if trigger == Trigger::Startup && !self.snapshots.contains(key)? {
                self.snapshots.save(key, &ours)?;
            }
            debug!(pair = %pair.name, "Already in sync");
            return Ok(SyncOutcome::AlreadyInSync);
        }

        let Some(base) = self.snapshots.load(key)? else {
            return self.initial_copy(pair, key, changed, partner, ours, theirs);
        };

        if ours == base {
            io::copy_preserving(partner, changed)?;
            self.snapshots.save(key, &theirs)?;
            info!(pair = %pair.name, "Synced from partner");
            return Ok(SyncOutcome::Copied(CopyDirection::FromPartner));
        }
        if theirs == base {
            io::copy_preserving(changed, partner)?;
            self.snapshots.save(key, &ours)?;
            info!(pair = %pair.name, "Synced to partner");
            return Ok(SyncOutcome::Copied(CopyDirection::ToPartner));
        }

        self.merge(pair, key, changed, partner, &base, &ours, &theirs)
    }

    fn initial_copy(
        &self,
        pair: &SyncPair,
        key: &PairKey,
        changed: &NormalizedPath,
        partner: &NormalizedPath,
        ours: String,
        theirs: String,
    ) -> Result<SyncOutcome> {
        let direction = if is_newer(changed, partner)? {
            io::copy_preserving(changed, partner)?;
            self.snapshots.save(key, &ours)?;
            CopyDirection::ToPartner
        } else {
            io::copy_preserving(partner, changed)?;
            self.snapshots.save(key, &theirs)?;
            CopyDirection::FromPartner
        };
        info!(pair = %pair.name, %direction, "Initial sync, newer side wins");
        Ok(SyncOutcome::InitialCopy(direction))
    }

    #[allow(clippy::too_many_arguments)]
    fn merge(
        &self,
        pair: &SyncPair,
        key: &PairKey,
        changed: &NormalizedPath,
        partner: &NormalizedPath,
        base: &str,
        ours: &str,
        theirs: &str,
    ) -> Result<SyncOutcome> {
        debug!(pair = %pair.name, "Attempting three-way merge");
        let result = three_way_merge(base, ours, theirs);

        io::write_text(changed, &result.content)?;
        io::write_text(partner, &result.content)?;

        if result.success {
            self.snapshots.save(key, &result.content)?;
            self.ledger.remove(key)?;
            info!(pair = %pair.name, "Auto-merged");
            return Ok(SyncOutcome::Merged);
        }

        let count = result.conflicts.len();
        if self.conflict_base == ConflictBasePolicy::Conflicted {
            self.snapshots.save(key, &result.content)?;
        }
        let record = ConflictRecord::new(
            changed,
            partner,
            &result.conflicts,
            self.clock.now().into(),
        );
        self.ledger.put(key, record)?;
        self.notifier.notify(&ConflictNotice {
            pair: pair.name.clone(),
            path: changed.clone(),
            partner: partner.clone(),
            conflict_count: count,
        });
        warn!(pair = %pair.name, conflicts = count, "Merge conflict");
        Ok(SyncOutcome::Conflicted { count })
    }

    /// Binary pairs: the newer file is copied over the older one.
    fn sync_binary(
        &self,
        pair: &SyncPair,
        changed: &NormalizedPath,
        partner: &NormalizedPath,
    ) -> Result<SyncOutcome> {
        let ours = io::modified_time(changed)?;
        let theirs = io::modified_time(partner)?;

        let direction = match ours.cmp(&theirs) {
            Ordering::Greater => {
                io::copy_preserving(changed, partner)?;
                CopyDirection::ToPartner
            }
            Ordering::Less => {
                io::copy_preserving(partner, changed)?;
                CopyDirection::FromPartner
            }
            Ordering::Equal => {
                debug!(pair = %pair.name, "Binary sides equally new");
                return Ok(SyncOutcome::BinaryUnchanged);
            }
        };
        info!(pair = %pair.name, %direction, "Binary synced");
        Ok(SyncOutcome::BinaryCopied(direction))
    }
}

/// Whether `a` was modified strictly after `b`.
fn is_newer(a: &NormalizedPath, b: &NormalizedPath) -> Result<bool> {
    Ok(io::modified_time(a)? > io::modified_time(b)?)
}

/// Read `path` as UTF-8 text. `None` when the content is not valid UTF-8.
fn read_if_text(path: &NormalizedPath) -> Result<Option<String>> {
    let bytes = io::read_bytes(path)?;
    Ok(String::from_utf8(bytes).ok())
}

/// Like [`read_if_text`], with a missing file also reading as `None`.
fn read_existing_text(path: &NormalizedPath) -> Result<Option<String>> {
    match read_if_text(path) {
        Err(e) if e.is_not_found() => Ok(None),
        other => other,
    }
}
