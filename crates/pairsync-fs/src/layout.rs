//! Data home layout
//!
//! All persistent state lives under one directory: the pair configuration,
//! base snapshots, the conflict ledger and lock files.

use std::fs;
use std::path::PathBuf;

use crate::constants::{HOME_ENV, SyncPath};
use crate::{Error, NormalizedPath, Result};

/// Resolved locations of every piece of persistent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncLayout {
    home: NormalizedPath,
    config_file: NormalizedPath,
}

impl SyncLayout {
    /// Layout rooted at `home` with the default config file name.
    pub fn new(home: impl Into<NormalizedPath>) -> Self {
        let home = home.into();
        let config_file = home.join(SyncPath::ConfigFile.as_str());
        Self { home, config_file }
    }

    /// Resolve the data home.
    ///
    /// Precedence: explicit `home`, then the `PAIRSYNC_HOME` environment
    /// variable, then the platform data directory (`<data_dir>/pairsync`).
    /// `config` overrides the location of the pair configuration file.
    pub fn resolve(home: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self> {
        let home = match home {
            Some(dir) => dir,
            None => match std::env::var_os(HOME_ENV) {
                Some(dir) if !dir.is_empty() => PathBuf::from(dir),
                _ => dirs::data_dir().ok_or(Error::NoDataDir)?.join("pairsync"),
            },
        };

        let layout = Self::new(home);
        Ok(match config {
            Some(config) => layout.with_config_file(config),
            None => layout,
        })
    }

    /// Replace the config file location.
    pub fn with_config_file(mut self, config_file: impl Into<NormalizedPath>) -> Self {
        self.config_file = config_file.into();
        self
    }

    pub fn home(&self) -> &NormalizedPath {
        &self.home
    }

    pub fn config_file(&self) -> &NormalizedPath {
        &self.config_file
    }

    pub fn bases_dir(&self) -> NormalizedPath {
        self.home.join(SyncPath::BasesDir.as_str())
    }

    pub fn conflicts_file(&self) -> NormalizedPath {
        self.home.join(SyncPath::ConflictsFile.as_str())
    }

    pub fn locks_dir(&self) -> NormalizedPath {
        self.home.join(SyncPath::LocksDir.as_str())
    }

    /// Create the home, bases and locks directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.home.clone(), self.bases_dir(), self.locks_dir()] {
            fs::create_dir_all(dir.to_native()).map_err(|e| Error::io(dir.to_native(), e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_home_wins() {
        let layout = SyncLayout::resolve(Some(PathBuf::from("/data/ps")), None).unwrap();
        assert_eq!(layout.home().as_str(), "/data/ps");
        assert_eq!(layout.config_file().as_str(), "/data/ps/sync-config.json");
        assert_eq!(layout.bases_dir().as_str(), "/data/ps/bases");
        assert_eq!(layout.conflicts_file().as_str(), "/data/ps/conflicts.json");
        assert_eq!(layout.locks_dir().as_str(), "/data/ps/locks");
    }

    #[test]
    fn config_override_keeps_home() {
        let layout = SyncLayout::resolve(
            Some(PathBuf::from("/data/ps")),
            Some(PathBuf::from("/etc/pairs.toml")),
        )
        .unwrap();
        assert_eq!(layout.home().as_str(), "/data/ps");
        assert_eq!(layout.config_file().as_str(), "/etc/pairs.toml");
    }
}
