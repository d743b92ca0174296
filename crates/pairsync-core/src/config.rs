//! Pair configuration
//!
//! The configuration file is owned by an external management surface; the
//! core only reads it. A missing or malformed file means "no pairs".

use std::collections::HashSet;
use std::time::Duration;

use pairsync_fs::classify::DEFAULT_SNIFF_BYTES;
use pairsync_fs::{ConfigStore, NormalizedPath, TextClassifier};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::pair::SyncPair;

/// One configured pair as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairEntry {
    #[serde(default)]
    pub name: String,
    pub source: String,
    pub target: String,
}

/// What becomes the base snapshot when a merge ends in conflict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictBasePolicy {
    /// Store the marker-laden merge output as the new base
    #[default]
    Conflicted,
    /// Keep the last agreed base
    Preserve,
}

/// Tunables of the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Events for a path are ignored for this long after a sync of it
    pub cooldown_ms: u64,
    /// A lock held longer than this is treated as abandoned
    pub stale_lock_secs: u64,
    /// Bytes sniffed for a null byte when classifying files
    pub sniff_bytes: usize,
    /// Extensions trusted as text in addition to the built-in list
    pub text_extensions: Vec<String>,
    pub conflict_base: ConflictBasePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cooldown_ms: 1000,
            stale_lock_secs: 300,
            sniff_bytes: DEFAULT_SNIFF_BYTES,
            text_extensions: Vec::new(),
            conflict_base: ConflictBasePolicy::default(),
        }
    }
}

impl Settings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_lock_secs)
    }

    pub fn classifier(&self) -> TextClassifier {
        TextClassifier::new(self.sniff_bytes).with_extensions(&self.text_extensions)
    }
}

/// Contents of the pair configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub pairs: Vec<PairEntry>,
    #[serde(default)]
    pub settings: Settings,
}

impl SyncConfig {
    /// Load the configuration at `path`.
    ///
    /// Never fails: an absent file yields an empty configuration, a malformed
    /// one is logged and yields an empty configuration as well.
    pub fn load(path: &NormalizedPath) -> Self {
        match ConfigStore::new().load_optional::<Self>(path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                warn!(path = %path, "No pair configuration found, no pairs tracked");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Invalid pair configuration, no pairs tracked");
                Self::default()
            }
        }
    }

    /// Validated pairs with `~/` expanded.
    ///
    /// A pair whose two sides are the same path, or that reuses a path
    /// claimed by an earlier pair, is skipped with a warning.
    pub fn sync_pairs(&self) -> Vec<SyncPair> {
        let mut claimed = HashSet::new();
        let mut pairs = Vec::new();

        for (i, entry) in self.pairs.iter().enumerate() {
            let source = NormalizedPath::expand_home(entry.source.trim());
            let target = NormalizedPath::expand_home(entry.target.trim());
            let name = if entry.name.trim().is_empty() {
                source
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("pair-{}", i + 1))
            } else {
                entry.name.clone()
            };

            if source.as_str().is_empty() || target.as_str().is_empty() {
                warn!(pair = %name, "Skipping pair with an empty path");
                continue;
            }
            if source == target {
                warn!(pair = %name, path = %source, "Skipping pair whose sides are the same file");
                continue;
            }
            if let Some(taken) = [&source, &target].into_iter().find(|p| claimed.contains(*p)) {
                warn!(pair = %name, path = %taken, "Skipping pair reusing a path of another pair");
                continue;
            }

            claimed.insert(source.clone());
            claimed.insert(target.clone());
            pairs.push(SyncPair {
                name,
                source,
                target,
            });
        }
        pairs
    }
}
