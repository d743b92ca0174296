//! SHA-256 keys
//!
//! The order-independent pair key names base snapshots and ledger entries;
//! the single-path key names lock files.

use sha2::{Digest, Sha256};

use crate::NormalizedPath;

/// Number of hex characters kept for a pair key.
pub const PAIR_KEY_LEN: usize = 16;

/// Derive the stable key identifying the pair `(a, b)`.
///
/// The two paths are sorted before hashing, so `pair_key(a, b)` and
/// `pair_key(b, a)` are equal. The result only depends on the path strings
/// and is stable across process restarts.
pub fn pair_key(a: &NormalizedPath, b: &NormalizedPath) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(first.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(second.as_str().as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..PAIR_KEY_LEN].to_string()
}

/// Key of a single path, the same length as a pair key. Names lock files.
pub fn path_key(path: &NormalizedPath) -> String {
    let hex = format!("{:x}", Sha256::digest(path.as_str().as_bytes()));
    hex[..PAIR_KEY_LEN].to_string()
}
