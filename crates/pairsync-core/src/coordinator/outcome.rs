use std::fmt;

use pairsync_merge::Side;

/// Direction of a whole-file copy, relative to the changed side.
///
/// During startup reconciliation the configured source plays the changed
/// side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDirection {
    /// The changed side was copied over its partner
    ToPartner,
    /// The partner was copied over the changed side
    FromPartner,
}

impl fmt::Display for CopyDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ToPartner => "to partner",
            Self::FromPartner => "from partner",
        })
    }
}

/// How an active conflict ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Both sides were edited to the same marker-free content
    Identical,
    /// Both sides are marker-free but differ; the newer one was kept
    NewerWins(CopyDirection),
    /// Only the changed side is marker-free
    FromChanged,
    /// Only the partner is marker-free
    FromPartner,
    /// Manual resolution keeping one half of every block
    Taken(Side),
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identical => f.write_str("identical"),
            Self::NewerWins(dir) => write!(f, "newer wins, copied {dir}"),
            Self::FromChanged => f.write_str("from changed side"),
            Self::FromPartner => f.write_str("from partner"),
            Self::Taken(side) => write!(f, "took {side}"),
        }
    }
}

/// What a sync attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The path belongs to no pair
    Untracked,
    /// Another sync of the path holds its lock
    Locked { owner_pid: u32 },
    /// The path was synced moments ago; the event is ignored
    CoolingDown,
    ConflictResolved(Resolution),
    /// A conflict is active and both sides still contain markers
    AwaitingResolution,
    /// The changed path no longer exists
    SourceMissing,
    BothMissing,
    /// One side did not exist and was created from the other
    Created(CopyDirection),
    BinaryCopied(CopyDirection),
    /// Binary sides with equal modification times
    BinaryUnchanged,
    AlreadyInSync,
    /// First reconciliation without a base; the newer side won
    InitialCopy(CopyDirection),
    /// One side was unchanged since the base and received the other
    Copied(CopyDirection),
    Merged,
    Conflicted { count: usize },
}

impl SyncOutcome {
    /// Stable machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Untracked => "untracked",
            Self::Locked { .. } => "locked",
            Self::CoolingDown => "cooling_down",
            Self::ConflictResolved(_) => "conflict_resolved",
            Self::AwaitingResolution => "awaiting_resolution",
            Self::SourceMissing => "source_missing",
            Self::BothMissing => "both_missing",
            Self::Created(_) => "created",
            Self::BinaryCopied(_) => "binary_copied",
            Self::BinaryUnchanged => "binary_unchanged",
            Self::AlreadyInSync => "already_in_sync",
            Self::InitialCopy(_) => "initial_copy",
            Self::Copied(_) => "copied",
            Self::Merged => "merged",
            Self::Conflicted { .. } => "conflicted",
        }
    }

    /// Whether the attempt wrote to either side.
    pub fn wrote_files(&self) -> bool {
        match self {
            Self::ConflictResolved(resolution) => *resolution != Resolution::Identical,
            Self::Created(_)
            | Self::BinaryCopied(_)
            | Self::InitialCopy(_)
            | Self::Copied(_)
            | Self::Merged
            | Self::Conflicted { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untracked => f.write_str("untracked path"),
            Self::Locked { owner_pid } => write!(f, "locked by process {owner_pid}"),
            Self::CoolingDown => f.write_str("cooling down"),
            Self::ConflictResolved(resolution) => write!(f, "conflict resolved ({resolution})"),
            Self::AwaitingResolution => f.write_str("conflict markers still present"),
            Self::SourceMissing => f.write_str("source missing"),
            Self::BothMissing => f.write_str("both files missing"),
            Self::Created(dir) => write!(f, "created missing side, copied {dir}"),
            Self::BinaryCopied(dir) => write!(f, "binary copied {dir}"),
            Self::BinaryUnchanged => f.write_str("binary unchanged"),
            Self::AlreadyInSync => f.write_str("already in sync"),
            Self::InitialCopy(dir) => write!(f, "initial sync, copied {dir}"),
            Self::Copied(dir) => write!(f, "synced, copied {dir}"),
            Self::Merged => f.write_str("auto-merged"),
            Self::Conflicted { count } => write!(f, "merge conflict ({count})"),
        }
    }
}
