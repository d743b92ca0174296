//! Conflict notification seam
//!
//! The coordinator reports every new conflict here. Desktop notifications or
//! any other user alert live behind this trait, outside the core.

use pairsync_fs::NormalizedPath;
use tracing::warn;

/// A merge that ended in conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictNotice {
    pub pair: String,
    pub path: NormalizedPath,
    pub partner: NormalizedPath,
    pub conflict_count: usize,
}

impl ConflictNotice {
    /// `"<n> conflict(s) in <file name>"`
    pub fn message(&self) -> String {
        let name = self.path.file_name().unwrap_or(self.path.as_str());
        format!("{} conflict(s) in {}", self.conflict_count, name)
    }
}

pub trait ConflictNotifier: Send + Sync {
    fn notify(&self, notice: &ConflictNotice);
}

/// Reports conflicts as log warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl ConflictNotifier for LogNotifier {
    fn notify(&self, notice: &ConflictNotice) {
        warn!(pair = %notice.pair, path = %notice.path, "{}", notice.message());
    }
}
