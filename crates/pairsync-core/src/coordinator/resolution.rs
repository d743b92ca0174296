//! Conflict resolution check
//!
//! Runs before anything else while a pair has a conflict record. The user
//! resolves a conflict by editing the markers away; as soon as one side is
//! marker-free it becomes authoritative.

use pairsync_fs::{NormalizedPath, io};
use pairsync_merge::has_conflict_markers;
use tracing::{debug, info};

use super::{Coordinator, CopyDirection, Resolution, SyncOutcome, is_newer, read_existing_text};
use crate::Result;
use crate::pair::{PairKey, SyncPair};

impl Coordinator {
    /// Settle the conflict of `pair` if its markers are gone.
    ///
    /// Returns `None` when the check cannot run because a side is missing or
    /// not text; the caller then continues with the regular rules.
    pub(super) fn check_resolution(
        &self,
        pair: &SyncPair,
        key: &PairKey,
        changed: &NormalizedPath,
        partner: &NormalizedPath,
    ) -> Result<Option<SyncOutcome>> {
        let (Some(ours), Some(theirs)) =
            (read_existing_text(changed)?, read_existing_text(partner)?)
        else {
            debug!(pair = %pair.name, "Conflict check skipped, a side is missing or not text");
            return Ok(None);
        };

        let resolution = match (has_conflict_markers(&ours), has_conflict_markers(&theirs)) {
            (true, true) => {
                debug!(pair = %pair.name, "Conflict markers still present");
                return Ok(Some(SyncOutcome::AwaitingResolution));
            }
            (false, false) if ours == theirs => {
                self.snapshots.save(key, &ours)?;
                Resolution::Identical
            }
            (false, false) => {
                if is_newer(changed, partner)? {
                    self.adopt(key, partner, &ours)?;
                    Resolution::NewerWins(CopyDirection::ToPartner)
                } else {
                    self.adopt(key, changed, &theirs)?;
                    Resolution::NewerWins(CopyDirection::FromPartner)
                }
            }
            (false, true) => {
                self.adopt(key, partner, &ours)?;
                Resolution::FromChanged
            }
            (true, false) => {
                self.adopt(key, changed, &theirs)?;
                Resolution::FromPartner
            }
        };

        self.ledger.remove(key)?;
        info!(pair = %pair.name, %resolution, "Conflict resolved");
        Ok(Some(SyncOutcome::ConflictResolved(resolution)))
    }

    /// Write the winning `content` over `loser` and make it the base.
    fn adopt(&self, key: &PairKey, loser: &NormalizedPath, content: &str) -> Result<()> {
        io::write_text(loser, content)?;
        self.snapshots.save(key, content)
    }
}
