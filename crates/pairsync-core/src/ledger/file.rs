use std::fs::{self, File, OpenOptions};
use std::io::Read;

use fs2::FileExt;
use pairsync_fs::NormalizedPath;
use tracing::{debug, warn};

use super::{ConflictLedger, ConflictMap, ConflictRecord};
use crate::pair::PairKey;
use crate::Result;

/// Ledger persisted as one JSON object, `conflicts.json`.
///
/// Reads take a shared lock and mutations an exclusive lock on a sidecar
/// `<file>.lock`, held across the whole read-modify-write. The file itself is
/// replaced by write-to-temp-then-rename.
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: NormalizedPath,
}

impl JsonLedger {
    pub fn new(path: impl Into<NormalizedPath>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    fn lock_file(&self) -> Result<File> {
        let lock_path = self.path.to_native().with_extension("json.lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        Ok(file)
    }

    /// Read the ledger with the caller holding the sidecar lock.
    ///
    /// `None` means the file exists but does not parse.
    fn read_locked(&self) -> Result<Option<ConflictMap>> {
        let native = self.path.to_native();
        let mut file = match File::open(&native) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Some(ConflictMap::new()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut content = String::new();
        file.read_to_string(&mut content)?;
        if content.trim().is_empty() {
            return Ok(Some(ConflictMap::new()));
        }
        match serde_json::from_str(&content) {
            Ok(map) => Ok(Some(map)),
            Err(e) => {
                debug!(path = %self.path, error = %e, "Conflict ledger does not parse");
                Ok(None)
            }
        }
    }

    /// Where a malformed ledger is moved: `conflicts.json.corrupt`.
    pub fn corrupt_path(&self) -> NormalizedPath {
        NormalizedPath::new(self.path.to_native().with_extension("json.corrupt"))
    }

    /// Move a malformed ledger aside, with the caller holding the exclusive
    /// sidecar lock. The previous `.corrupt` file is replaced.
    fn quarantine_locked(&self) -> Result<()> {
        let corrupt = self.corrupt_path();
        fs::rename(self.path.to_native(), corrupt.to_native())?;
        warn!(
            path = %self.path,
            moved_to = %corrupt,
            "Malformed conflict ledger moved aside, starting empty"
        );
        Ok(())
    }

    /// Replace the ledger with the caller holding the sidecar lock.
    fn write_locked(&self, map: &ConflictMap) -> Result<()> {
        let content = serde_json::to_string_pretty(map)?;
        let native = self.path.to_native();
        let temp_path = native.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        if let Err(e) = fs::rename(&temp_path, &native) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Run `mutate` on the ledger contents under an exclusive lock and
    /// persist the result when it reports a change.
    fn update<T>(&self, mutate: impl FnOnce(&mut ConflictMap) -> (T, bool)) -> Result<T> {
        let lock = self.lock_file()?;
        lock.lock_exclusive()?;

        let mut map = match self.read_locked()? {
            Some(map) => map,
            None => {
                self.quarantine_locked()?;
                ConflictMap::new()
            }
        };
        let (value, changed) = mutate(&mut map);
        if changed {
            self.write_locked(&map)?;
        }

        // Lock released when lock is dropped
        Ok(value)
    }
}

impl ConflictLedger for JsonLedger {
    fn put(&self, key: &PairKey, record: ConflictRecord) -> Result<()> {
        self.update(|map| {
            map.insert(key.clone(), record);
            ((), true)
        })?;
        debug!(key = %key, "Conflict record stored");
        Ok(())
    }

    fn remove(&self, key: &PairKey) -> Result<bool> {
        let removed = self.update(|map| {
            let removed = map.remove(key).is_some();
            (removed, removed)
        })?;
        if removed {
            debug!(key = %key, "Conflict record removed");
        }
        Ok(removed)
    }

    fn get_all(&self) -> Result<ConflictMap> {
        if !self.path.exists() {
            return Ok(ConflictMap::new());
        }
        {
            let lock = self.lock_file()?;
            lock.lock_shared()?;
            if let Some(map) = self.read_locked()? {
                return Ok(map);
            }
        }
        // Malformed: retake the lock exclusively to move the file aside.
        self.update(|map| (map.clone(), false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn record(source: &str) -> ConflictRecord {
        ConflictRecord::new(&source.into(), &"/partner".into(), &[], Utc::now())
    }

    #[test]
    fn missing_file_is_empty_ledger() {
        let dir = tempdir().unwrap();
        let ledger = JsonLedger::new(dir.path().join("conflicts.json"));
        assert!(ledger.get_all().unwrap().is_empty());
    }

    #[test]
    fn put_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conflicts.json");
        let ledger = JsonLedger::new(path.as_path());
        let key = PairKey::for_paths(&"/a".into(), &"/b".into());

        ledger.put(&key, record("/a")).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains(key.as_str()));
    }

    #[test]
    fn removing_absent_key_does_not_create_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conflicts.json");
        let ledger = JsonLedger::new(path.as_path());

        assert!(!ledger.remove(&PairKey::for_paths(&"/a".into(), &"/b".into())).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn malformed_file_is_moved_aside_on_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conflicts.json");
        fs::write(&path, "{not json").unwrap();
        let ledger = JsonLedger::new(path.as_path());

        assert!(ledger.get_all().unwrap().is_empty());
        assert!(!path.exists());
        assert_eq!(
            fs::read_to_string(ledger.corrupt_path().to_native()).unwrap(),
            "{not json"
        );
    }
}
