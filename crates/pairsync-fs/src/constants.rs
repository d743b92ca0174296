//! Names of the entries inside the pairsync data home.

use std::path::Path;

/// Well-known files and directories of the data home.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPath {
    /// The pair configuration file
    ConfigFile,
    /// Directory holding one base snapshot per pair
    BasesDir,
    /// The conflict ledger
    ConflictsFile,
    /// Directory holding pair lock files
    LocksDir,
}

impl SyncPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigFile => "sync-config.json",
            Self::BasesDir => "bases",
            Self::ConflictsFile => "conflicts.json",
            Self::LocksDir => "locks",
        }
    }
}

/// File extension of base snapshot files.
pub const BASE_EXTENSION: &str = "base";

/// File extension of lock files.
pub const LOCK_EXTENSION: &str = "lock";

/// Environment variable overriding the data home.
pub const HOME_ENV: &str = "PAIRSYNC_HOME";

impl AsRef<Path> for SyncPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for SyncPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for SyncPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
