//! [`PairFixture`] for sync scenarios.

use std::fs::{self, File};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use pairsync_core::{
    Clock, ConflictNotifier, Coordinator, FsSnapshotStore, JsonLedger, ManualClock, PairLocks,
    PairMap, SyncPair,
};
use pairsync_fs::{NormalizedPath, SyncLayout};
use tempfile::TempDir;

/// A temporary directory holding a data home (`home/`) and two sibling
/// directories, `left/` and `right/`, whose files get paired.
///
/// # Example
///
/// ```rust,no_run
/// use pairsync_test_utils::PairFixture;
///
/// let fixture = PairFixture::new();
/// let pair = fixture.pair("notes", "notes.md");
/// fixture.write(&pair.source, "hello\n");
/// fixture.assert_content(&pair.source, "hello\n");
/// ```
pub struct PairFixture {
    temp_dir: TempDir,
    layout: SyncLayout,
}

impl Default for PairFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A coordinator over a fixture's data home, with handles on its notifier
/// and clock.
pub struct Harness {
    pub coordinator: Coordinator,
    pub notifier: Arc<crate::RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl PairFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("left")).unwrap();
        fs::create_dir_all(root.join("right")).unwrap();
        let layout = SyncLayout::new(root.join("home"));
        layout.ensure_dirs().unwrap();
        Self { temp_dir, layout }
    }

    pub fn root(&self) -> NormalizedPath {
        NormalizedPath::new(self.temp_dir.path())
    }

    pub fn layout(&self) -> &SyncLayout {
        &self.layout
    }

    /// Pair `left/<file>` (source) with `right/<file>` (target). No file is
    /// created.
    pub fn pair(&self, name: &str, file: &str) -> SyncPair {
        let root = self.root();
        SyncPair::new(
            name,
            root.join("left").join(file),
            root.join("right").join(file),
        )
    }

    pub fn write(&self, path: &NormalizedPath, content: &str) {
        let native = path.to_native();
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&native, content).unwrap();
    }

    pub fn write_bytes(&self, path: &NormalizedPath, content: &[u8]) {
        fs::write(path.to_native(), content).unwrap();
    }

    pub fn read(&self, path: &NormalizedPath) -> String {
        fs::read_to_string(path.to_native())
            .unwrap_or_else(|e| panic!("Could not read {path}: {e}"))
    }

    pub fn remove(&self, path: &NormalizedPath) {
        fs::remove_file(path.to_native()).unwrap();
    }

    /// Set the modification time of `path`.
    pub fn set_mtime(&self, path: &NormalizedPath, mtime: SystemTime) {
        File::options()
            .write(true)
            .open(path.to_native())
            .and_then(|f| f.set_modified(mtime))
            .unwrap_or_else(|e| panic!("Could not set mtime of {path}: {e}"));
    }

    /// Make `path` look `secs` seconds old.
    pub fn age(&self, path: &NormalizedPath, secs: u64) {
        self.set_mtime(path, SystemTime::now() - Duration::from_secs(secs));
    }

    /// Write the pair configuration file for `pairs`, with optional
    /// `settings` JSON.
    pub fn write_config(&self, pairs: &[SyncPair], settings: Option<serde_json::Value>) {
        let pairs: Vec<serde_json::Value> = pairs
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "source": p.source.as_str(),
                    "target": p.target.as_str(),
                })
            })
            .collect();
        let mut config = serde_json::json!({ "pairs": pairs });
        if let Some(settings) = settings {
            config["settings"] = settings;
        }
        fs::write(
            self.layout.config_file().to_native(),
            serde_json::to_string_pretty(&config).unwrap(),
        )
        .unwrap();
    }

    /// A file-backed coordinator over this fixture's data home, with zero
    /// cooldown so consecutive events are never swallowed.
    pub fn harness(&self, pairs: Vec<SyncPair>) -> Harness {
        self.harness_with_cooldown(pairs, Duration::ZERO)
    }

    pub fn harness_with_cooldown(&self, pairs: Vec<SyncPair>, cooldown: Duration) -> Harness {
        let notifier = Arc::new(crate::RecordingNotifier::new());
        let clock = Arc::new(ManualClock::starting_now());
        let dyn_clock: Arc<dyn Clock> = clock.clone();

        let locks = PairLocks::new(self.layout.locks_dir(), Arc::clone(&dyn_clock))
            .with_cooldown(cooldown);
        let coordinator = Coordinator::new(
            PairMap::new(pairs),
            Arc::new(FsSnapshotStore::new(self.layout.bases_dir())),
            Arc::new(JsonLedger::new(self.layout.conflicts_file())),
            locks,
            dyn_clock,
        )
        .with_notifier(notifier.clone() as Arc<dyn ConflictNotifier>);

        Harness {
            coordinator,
            notifier,
            clock,
        }
    }

    /// Assert the exact content of `path`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or differs.
    pub fn assert_content(&self, path: &NormalizedPath, expected: &str) {
        let actual = self.read(path);
        assert_eq!(actual, expected, "Unexpected content in {path}");
    }
}
