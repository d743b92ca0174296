use pairsync_fs::constants::BASE_EXTENSION;
use pairsync_fs::{NormalizedPath, RobustnessConfig, io};
use tracing::debug;

use super::SnapshotStore;
use crate::Result;
use crate::pair::PairKey;

/// Snapshots stored as `<dir>/<key>.base`, plain content, no metadata.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    dir: NormalizedPath,
    robustness: RobustnessConfig,
}

impl FsSnapshotStore {
    pub fn new(dir: impl Into<NormalizedPath>) -> Self {
        Self {
            dir: dir.into(),
            robustness: RobustnessConfig::default(),
        }
    }

    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }

    pub fn path_for(&self, key: &PairKey) -> NormalizedPath {
        self.dir.join(&format!("{key}.{BASE_EXTENSION}"))
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn load(&self, key: &PairKey) -> Result<Option<String>> {
        match io::read_text(&self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &PairKey, content: &str) -> Result<()> {
        let path = self.path_for(key);
        io::write_atomic(&path, content.as_bytes(), self.robustness)?;
        debug!(key = %key, "Base snapshot saved");
        Ok(())
    }

    fn contains(&self, key: &PairKey) -> Result<bool> {
        Ok(self.path_for(key).is_file())
    }
}
