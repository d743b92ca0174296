//! Error types for pairsync-core

use std::path::PathBuf;

/// Result type for pairsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pairsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The conflict ledger could not be read or written
    #[error("Ledger error: {message}")]
    Ledger { message: String },

    /// A pair lock file could not be created, read or updated
    #[error("Lock error at {path}: {message}")]
    Lock { path: PathBuf, message: String },

    /// No configured pair matches the given name or path
    #[error("No pair named or containing '{0}'")]
    PairNotFound(String),

    /// The pair has no active conflict record
    #[error("Pair '{0}' is not in conflict")]
    NotInConflict(String),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from pairsync-fs
    #[error(transparent)]
    Fs(#[from] pairsync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn lock(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Lock {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error means a file vanished.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Fs(e) => e.is_not_found(),
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
