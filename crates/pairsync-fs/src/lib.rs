//! Filesystem layer for pairsync
//!
//! Provides normalized path handling, atomic I/O, metadata-preserving copies,
//! text/binary classification and the stable pair-key derivation shared by the
//! snapshot store and the conflict ledger.

pub mod checksum;
pub mod classify;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use checksum::{pair_key, path_key};
pub use classify::TextClassifier;
pub use config::ConfigStore;
pub use constants::SyncPath;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use layout::SyncLayout;
pub use path::NormalizedPath;
