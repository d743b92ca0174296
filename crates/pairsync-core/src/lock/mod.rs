//! Per-path pair locks
//!
//! A lock suppresses the change events the coordinator causes with its own
//! writes. Acquisition never blocks: a held lock or an active cooldown makes
//! the attempt report why it failed and the event is dropped.
//!
//! Each lock is a file `locks/<path key>.lock` holding a [`LockRecord`].
//! While a sync runs the record has no `cooldown_until`. Dropping the
//! [`PairLockGuard`] rewrites it with `cooldown_until = now + cooldown`, which
//! turns the file into an "ignore events for this path until T" marker. An
//! attempt after T takes the lock over.
//!
//! A lock whose owner died mid-sync would block its path forever, so a held
//! record older than `stale_after`, or one that cannot be parsed, is
//! reclaimed.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use pairsync_fs::constants::LOCK_EXTENSION;
use pairsync_fs::{NormalizedPath, RobustnessConfig, io, path_key};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);
const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// Contents of a lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// The locked path
    pub path: String,
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
    /// Set once the owning sync finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl LockRecord {
    fn held(path: &NormalizedPath, now: SystemTime) -> Self {
        Self {
            path: path.as_str().to_string(),
            pid: std::process::id(),
            acquired_at: now.into(),
            cooldown_until: None,
        }
    }
}

/// Outcome of [`PairLocks::try_acquire`].
#[derive(Debug)]
pub enum LockAttempt {
    Acquired(PairLockGuard),
    /// Another sync of this path is running
    Held { owner_pid: u32 },
    /// The path was synced recently; events are ignored until `until`
    CoolingDown { until: SystemTime },
}

/// Manager of the lock directory.
#[derive(Debug, Clone)]
pub struct PairLocks {
    dir: NormalizedPath,
    cooldown: Duration,
    stale_after: Duration,
    clock: Arc<dyn Clock>,
}

impl PairLocks {
    pub fn new(dir: impl Into<NormalizedPath>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            cooldown: DEFAULT_COOLDOWN,
            stale_after: DEFAULT_STALE_AFTER,
            clock,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Lock file used for `path`.
    pub fn lock_path(&self, path: &NormalizedPath) -> NormalizedPath {
        self.dir.join(&format!("{}.{LOCK_EXTENSION}", path_key(path)))
    }

    /// Try to take the lock of `path` without waiting.
    pub fn try_acquire(&self, path: &NormalizedPath) -> Result<LockAttempt> {
        let lock_path = self.lock_path(path);
        let native = lock_path.to_native();
        let dir = self.dir.to_native();
        fs::create_dir_all(&dir).map_err(|e| Error::lock(&dir, e))?;

        let now = self.clock.now();
        let record = LockRecord::held(path, now);

        match OpenOptions::new().write(true).create_new(true).open(&native) {
            Ok(mut file) => {
                let bytes = serde_json::to_vec(&record)?;
                file.write_all(&bytes).map_err(|e| Error::lock(&native, e))?;
                debug!(path = %path, "Pair lock acquired");
                return Ok(LockAttempt::Acquired(self.guard(lock_path, record)));
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(Error::lock(&native, e)),
        }

        match read_record(&lock_path) {
            Ok(existing) => match existing.cooldown_until {
                Some(until) => {
                    let until = SystemTime::from(until);
                    if now < until {
                        return Ok(LockAttempt::CoolingDown { until });
                    }
                    debug!(path = %path, "Cooldown over, taking lock");
                }
                None => {
                    let age = age_of(&existing, now);
                    if age < self.stale_after {
                        return Ok(LockAttempt::Held {
                            owner_pid: existing.pid,
                        });
                    }
                    warn!(
                        path = %path,
                        owner_pid = existing.pid,
                        age_secs = age.as_secs(),
                        "Reclaiming stale pair lock"
                    );
                }
            },
            Err(message) => {
                warn!(
                    path = %path,
                    error = %message,
                    "Reclaiming pair lock with unreadable record"
                );
            }
        }

        write_record(&lock_path, &record)?;
        debug!(path = %path, "Pair lock acquired");
        Ok(LockAttempt::Acquired(self.guard(lock_path, record)))
    }

    /// Remove expired cooldown markers, stale locks and unreadable lock
    /// files. Returns how many files were removed.
    pub fn sweep(&self) -> Result<usize> {
        let dir = self.dir.to_native();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(Error::lock(&dir, e)),
        };

        let now = self.clock.now();
        let mut removed = 0;
        for entry in entries.flatten() {
            let native = entry.path();
            if native.extension().and_then(|e| e.to_str()) != Some(LOCK_EXTENSION) {
                continue;
            }
            let lock_path = NormalizedPath::new(&native);
            let expired = match read_record(&lock_path) {
                Ok(record) => match record.cooldown_until {
                    Some(until) => SystemTime::from(until) <= now,
                    None => age_of(&record, now) >= self.stale_after,
                },
                Err(_) => true,
            };
            if expired {
                match fs::remove_file(&native) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(Error::lock(&native, e)),
                }
            }
        }

        if removed > 0 {
            debug!(removed, "Swept pair locks");
        }
        Ok(removed)
    }

    fn guard(&self, lock_path: NormalizedPath, record: LockRecord) -> PairLockGuard {
        PairLockGuard {
            lock_path,
            record,
            cooldown: self.cooldown,
            clock: Arc::clone(&self.clock),
        }
    }
}

/// A held pair lock. Dropping it starts the cooldown.
#[derive(Debug)]
pub struct PairLockGuard {
    lock_path: NormalizedPath,
    record: LockRecord,
    cooldown: Duration,
    clock: Arc<dyn Clock>,
}

impl PairLockGuard {
    /// The locked path.
    pub fn path(&self) -> &str {
        &self.record.path
    }
}

impl Drop for PairLockGuard {
    fn drop(&mut self) {
        if self.cooldown.is_zero() {
            if let Err(e) = fs::remove_file(self.lock_path.to_native())
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %self.record.path, error = %e, "Failed to release pair lock");
            }
            return;
        }

        let until = self.clock.now() + self.cooldown;
        let record = LockRecord {
            cooldown_until: Some(until.into()),
            ..self.record.clone()
        };
        if let Err(e) = write_record(&self.lock_path, &record) {
            warn!(path = %self.record.path, error = %e, "Failed to start pair lock cooldown");
        }
    }
}

fn age_of(record: &LockRecord, now: SystemTime) -> Duration {
    now.duration_since(SystemTime::from(record.acquired_at))
        .unwrap_or_default()
}

fn read_record(lock_path: &NormalizedPath) -> std::result::Result<LockRecord, String> {
    let content = io::read_text(lock_path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}

fn write_record(lock_path: &NormalizedPath, record: &LockRecord) -> Result<()> {
    let bytes = serde_json::to_vec(record)?;
    let robustness = RobustnessConfig {
        enable_fsync: false,
        ..RobustnessConfig::default()
    };
    io::write_atomic(lock_path, &bytes, robustness)
        .map_err(|e| Error::lock(lock_path.to_native(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn locks(dir: &std::path::Path, clock: &Arc<ManualClock>) -> PairLocks {
        PairLocks::new(dir.join("locks"), clock.clone() as Arc<dyn Clock>)
    }

    #[test]
    fn second_attempt_while_held_is_refused() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::starting_now());
        let locks = locks(dir.path(), &clock);
        let path = NormalizedPath::new("/data/a.txt");

        let first = locks.try_acquire(&path).unwrap();
        assert!(matches!(first, LockAttempt::Acquired(_)));

        let second = locks.try_acquire(&path).unwrap();
        assert!(
            matches!(second, LockAttempt::Held { owner_pid } if owner_pid == std::process::id())
        );
    }

    #[test]
    fn zero_cooldown_removes_lock_file() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::starting_now());
        let locks = locks(dir.path(), &clock).with_cooldown(Duration::ZERO);
        let path = NormalizedPath::new("/data/a.txt");

        let LockAttempt::Acquired(guard) = locks.try_acquire(&path).unwrap() else {
            panic!("expected lock");
        };
        drop(guard);

        assert!(!locks.lock_path(&path).exists());
        assert!(matches!(locks.try_acquire(&path).unwrap(), LockAttempt::Acquired(_)));
    }

    #[test]
    fn lock_file_name_is_path_key() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(ManualClock::starting_now());
        let locks = locks(dir.path(), &clock);
        let path = NormalizedPath::new("/data/a.txt");

        let file_name = locks.lock_path(&path).file_name().unwrap().to_string();
        assert_eq!(file_name, format!("{}.lock", path_key(&path)));
    }
}
