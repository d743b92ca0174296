//! Long-running daemon state
//!
//! Owns the coordinator and swaps it out when the pair configuration file
//! changes. Event delivery itself (the file watcher) lives in the binary.

use std::sync::Arc;

use pairsync_fs::{NormalizedPath, SyncLayout};
use tracing::{error, info, warn};

use crate::Result;
use crate::config::SyncConfig;
use crate::coordinator::{Coordinator, PairReport, SyncOutcome};
use crate::lock::Clock;
use crate::notify::ConflictNotifier;

/// What the daemon did with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// The configuration was reloaded and the new pairs reconciled
    Reloaded { pairs: usize },
    Synced(SyncOutcome),
    /// The sync failed; the daemon keeps running
    Failed(String),
}

pub struct Daemon {
    layout: SyncLayout,
    notifier: Arc<dyn ConflictNotifier>,
    clock: Arc<dyn Clock>,
    coordinator: Coordinator,
}

impl Daemon {
    /// Load the configuration, clear leftover locks and reconcile every pair.
    pub fn start(
        layout: SyncLayout,
        notifier: Arc<dyn ConflictNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        layout.ensure_dirs()?;
        let coordinator = build(&layout, &notifier, &clock);

        match coordinator.locks().sweep() {
            Ok(removed) if removed > 0 => info!(removed, "Removed leftover pair locks"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not sweep pair locks"),
        }

        let daemon = Self {
            layout,
            notifier,
            clock,
            coordinator,
        };
        info!(
            pairs = daemon.coordinator.pairs().len(),
            config = %daemon.layout.config_file(),
            "Daemon started"
        );
        if daemon.coordinator.pairs().is_empty() {
            info!("No file pairs configured, waiting for configuration changes");
        }
        daemon.coordinator.initial_sync();
        Ok(daemon)
    }

    /// Handle one change event. Never fails: errors are logged and reported
    /// as [`DaemonEvent::Failed`].
    pub fn handle_event(&mut self, path: &NormalizedPath) -> DaemonEvent {
        if self.is_config_file(path) {
            let pairs = self.reload().len();
            return DaemonEvent::Reloaded { pairs };
        }

        match self.coordinator.on_change(path) {
            Ok(outcome) => DaemonEvent::Synced(outcome),
            Err(e) => {
                error!(path = %path, error = %e, "Sync failed");
                DaemonEvent::Failed(e.to_string())
            }
        }
    }

    /// Re-read the configuration and reconcile every pair.
    pub fn reload(&mut self) -> Vec<PairReport> {
        self.coordinator = build(&self.layout, &self.notifier, &self.clock);
        info!(
            pairs = self.coordinator.pairs().len(),
            "Configuration reloaded"
        );
        self.coordinator.initial_sync()
    }

    /// Every path whose changes matter: both sides of every pair and the
    /// configuration file.
    pub fn watched_paths(&self) -> Vec<NormalizedPath> {
        let mut paths: Vec<NormalizedPath> = self.coordinator.pairs().paths().cloned().collect();
        paths.push(self.layout.config_file().clone());
        paths
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn layout(&self) -> &SyncLayout {
        &self.layout
    }

    fn is_config_file(&self, path: &NormalizedPath) -> bool {
        let config = self.layout.config_file();
        if path == config {
            return true;
        }
        match (path.canonicalize(), config.canonicalize()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

fn build(
    layout: &SyncLayout,
    notifier: &Arc<dyn ConflictNotifier>,
    clock: &Arc<dyn Clock>,
) -> Coordinator {
    let config = SyncConfig::load(layout.config_file());
    Coordinator::from_layout(layout, &config, Arc::clone(notifier), Arc::clone(clock))
}
