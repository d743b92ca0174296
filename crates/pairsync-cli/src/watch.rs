//! File watching for the daemon
//!
//! Paired files are often replaced by rename (editors, atomic writers), so
//! the watcher observes the parent directory of every watched path,
//! non-recursively, and filters events down to the paths themselves.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use pairsync_fs::NormalizedPath;
use tracing::{debug, warn};

use crate::error::Result;

/// Watches a fixed set of files. Rebuild it when the set changes.
pub struct PairWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    watched: HashSet<NormalizedPath>,
}

impl PairWatcher {
    pub fn new(paths: &[NormalizedPath]) -> Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        for dir in watch_dirs(paths) {
            if !dir.is_dir() {
                warn!(dir = %dir.display(), "Directory does not exist, not watched");
                continue;
            }
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
            debug!(dir = %dir.display(), "Watching directory");
        }

        let mut watched: HashSet<NormalizedPath> = paths.iter().cloned().collect();
        watched.extend(paths.iter().filter_map(NormalizedPath::canonicalize));

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            watched,
        })
    }

    /// Block until an event touches watched paths and return them.
    ///
    /// Returns `None` once the watcher has shut down.
    pub fn next_paths(&self) -> Option<Vec<NormalizedPath>> {
        loop {
            match self.receiver.recv().ok()? {
                Ok(event) => {
                    let paths = self.relevant_paths(&event);
                    if !paths.is_empty() {
                        return Some(paths);
                    }
                }
                Err(e) => warn!(error = %e, "File watcher error"),
            }
        }
    }

    fn relevant_paths(&self, event: &Event) -> Vec<NormalizedPath> {
        if !is_change(&event.kind) {
            return Vec::new();
        }
        let mut seen = BTreeSet::new();
        event
            .paths
            .iter()
            .map(NormalizedPath::new)
            .filter(|path| self.watched.contains(path))
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }
}

/// Parent directories of `paths`, deduplicated.
pub fn watch_dirs(paths: &[NormalizedPath]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|path| path.to_native().parent().map(|p| p.to_path_buf()))
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Content changes, creations, removals and renames. Access and metadata
/// events are noise: every sync itself sets file times.
fn is_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Any | EventKind::Access(_) | EventKind::Other => false,
    }
}
