//! Command implementations for pairsync-cli

pub mod conflicts;
pub mod merge;
pub mod run;
pub mod status;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use pairsync_core::{Coordinator, LogNotifier, SyncConfig, SystemClock};
use pairsync_fs::SyncLayout;

pub use conflicts::{run_conflicts, run_resolve};
pub use merge::run_merge;
pub use run::run_daemon;
pub use status::run_status;
pub use sync::run_sync;

use crate::error::Result;

/// Resolve the data home from the global flags, creating it if needed.
pub fn layout(home: Option<PathBuf>, config: Option<PathBuf>) -> Result<SyncLayout> {
    let layout = SyncLayout::resolve(home, config)?;
    layout.ensure_dirs()?;
    Ok(layout)
}

/// A coordinator over `layout` for one-shot commands.
pub fn coordinator(layout: &SyncLayout) -> Coordinator {
    let config = SyncConfig::load(layout.config_file());
    Coordinator::from_layout(layout, &config, Arc::new(LogNotifier), Arc::new(SystemClock))
}
