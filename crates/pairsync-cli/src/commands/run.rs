//! The `run` command: the long-running daemon

use std::sync::Arc;

use colored::Colorize;
use pairsync_core::{Daemon, DaemonEvent, LogNotifier, SyncOutcome, SystemClock};
use pairsync_fs::SyncLayout;
use tracing::{debug, info};

use crate::error::Result;
use crate::watch::PairWatcher;

/// Start the daemon and process change events until the watcher stops.
pub fn run_daemon(layout: SyncLayout) -> Result<()> {
    let mut daemon = Daemon::start(layout, Arc::new(LogNotifier), Arc::new(SystemClock))?;

    println!(
        "{} Watching {} pair(s), config {}",
        "=>".blue().bold(),
        daemon.coordinator().pairs().len(),
        daemon.layout().config_file().as_str().cyan()
    );

    loop {
        let watcher = PairWatcher::new(&daemon.watched_paths())?;
        if !watch_until_reload(&mut daemon, &watcher) {
            info!("File watcher stopped");
            return Ok(());
        }
        debug!("Rebuilding file watcher after reload");
    }
}

/// Feed events to the daemon. Returns `true` when the configuration was
/// reloaded and the watcher must be rebuilt, `false` when events ran out.
fn watch_until_reload(daemon: &mut Daemon, watcher: &PairWatcher) -> bool {
    while let Some(paths) = watcher.next_paths() {
        let mut reloaded = false;
        for path in paths {
            match daemon.handle_event(&path) {
                DaemonEvent::Reloaded { pairs } => {
                    info!(pairs, "Now watching");
                    reloaded = true;
                }
                DaemonEvent::Synced(SyncOutcome::Untracked) => {}
                DaemonEvent::Synced(outcome) => debug!(path = %path, %outcome, "Event handled"),
                DaemonEvent::Failed(_) => {}
            }
        }
        if reloaded {
            return true;
        }
    }
    false
}
