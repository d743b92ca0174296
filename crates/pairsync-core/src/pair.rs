//! Sync pairs and the path-to-partner lookup

use std::collections::HashMap;
use std::fmt;

use pairsync_fs::{NormalizedPath, pair_key};
use serde::{Deserialize, Serialize};

/// Order-independent key of a pair.
///
/// Names the pair's base snapshot and its conflict ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairKey(String);

impl PairKey {
    pub fn for_paths(a: &NormalizedPath, b: &NormalizedPath) -> Self {
        Self(pair_key(a, b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two files kept consistent with each other.
///
/// `name` is display metadata only. Identity is the unordered path pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPair {
    pub name: String,
    pub source: NormalizedPath,
    pub target: NormalizedPath,
}

impl SyncPair {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<NormalizedPath>,
        target: impl Into<NormalizedPath>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn key(&self) -> PairKey {
        PairKey::for_paths(&self.source, &self.target)
    }

    /// The other side of `path`, if `path` is one of the two sides.
    pub fn partner_of(&self, path: &NormalizedPath) -> Option<&NormalizedPath> {
        if *path == self.source {
            Some(&self.target)
        } else if *path == self.target {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Display name of the file, taken from the source side.
    pub fn file_name(&self) -> &str {
        self.source.file_name().unwrap_or(self.source.as_str())
    }
}

/// A changed path resolved against the pair map.
#[derive(Debug, Clone, Copy)]
pub struct PairMatch<'a> {
    pub pair: &'a SyncPair,
    /// The configured form of the changed path
    pub changed: &'a NormalizedPath,
    pub partner: &'a NormalizedPath,
}

/// Bidirectional lookup from either side of a pair to its partner.
///
/// Configured paths are indexed as written and, when they exist, in their
/// canonical form, so that paths reported through a symlinked directory still
/// resolve.
#[derive(Debug, Clone, Default)]
pub struct PairMap {
    pairs: Vec<SyncPair>,
    index: HashMap<NormalizedPath, (usize, bool)>,
}

impl PairMap {
    /// Build the map. Pairs must already be validated (see
    /// [`SyncConfig::sync_pairs`](crate::SyncConfig::sync_pairs)).
    pub fn new(pairs: Vec<SyncPair>) -> Self {
        let mut index = HashMap::new();
        for (i, pair) in pairs.iter().enumerate() {
            for (path, is_source) in [(&pair.source, true), (&pair.target, false)] {
                index.insert(path.clone(), (i, is_source));
                if let Some(canonical) = path.canonicalize() {
                    index.entry(canonical).or_insert((i, is_source));
                }
            }
        }
        Self { pairs, index }
    }

    /// Resolve `path` to its pair and partner.
    pub fn lookup(&self, path: &NormalizedPath) -> Option<PairMatch<'_>> {
        let hit = self.index.get(path).or_else(|| {
            path.canonicalize()
                .and_then(|canonical| self.index.get(&canonical))
        })?;
        let (i, is_source) = *hit;
        let pair = &self.pairs[i];
        let (changed, partner) = if is_source {
            (&pair.source, &pair.target)
        } else {
            (&pair.target, &pair.source)
        };
        Some(PairMatch {
            pair,
            changed,
            partner,
        })
    }

    pub fn contains(&self, path: &NormalizedPath) -> bool {
        self.lookup(path).is_some()
    }

    /// Find a pair by name, or by either of its paths.
    pub fn find(&self, query: &str) -> Option<&SyncPair> {
        self.pairs
            .iter()
            .find(|p| p.name == query)
            .or_else(|| self.lookup(&NormalizedPath::new(query)).map(|m| m.pair))
    }

    pub fn pairs(&self) -> &[SyncPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Every configured path, both sides of every pair.
    pub fn paths(&self) -> impl Iterator<Item = &NormalizedPath> {
        self.pairs.iter().flat_map(|p| [&p.source, &p.target])
    }
}
