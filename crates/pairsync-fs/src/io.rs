//! Atomic I/O operations with file locking

use std::fs::{self, File, FileTimes, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Distinguishes temp files of concurrent writers inside one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Tuning knobs for atomic writes.
#[derive(Debug, Clone, Copy)]
pub struct RobustnessConfig {
    /// How long to keep retrying a contended advisory lock before giving up.
    pub lock_timeout: Duration,
    /// Flush file contents to disk before the rename.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            enable_fsync: true,
        }
    }
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes, so a
/// watcher never observes a half-written file. The temp file lives in the
/// same directory (same filesystem) and is held under an exclusive advisory
/// lock while it is being filled. An existing destination keeps its
/// permissions.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    if let Err(e) = lock_with_timeout(&temp_file, config.lock_timeout) {
        let _ = fs::remove_file(&temp_path);
        tracing::debug!(path = %native_path.display(), error = %e, "Lock not acquired");
        return Err(Error::LockFailed { path: native_path });
    }

    let written = temp_file
        .write_all(content)
        .and_then(|_| {
            if config.enable_fsync {
                temp_file.sync_all()
            } else {
                Ok(())
            }
        })
        .map_err(|e| Error::io(&temp_path, e));

    let _ = FileExt::unlock(&temp_file);
    drop(temp_file);

    let prepared = written.and_then(|_| match fs::metadata(&native_path) {
        Ok(existing) => fs::set_permissions(&temp_path, existing.permissions())
            .map_err(|e| Error::io(&temp_path, e)),
        Err(_) => Ok(()),
    });
    if let Err(e) = prepared {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, &native_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(&native_path, e)
    })
}

fn lock_with_timeout(file: &File, timeout: Duration) -> std::io::Result<()> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(10))
        .with_max_interval(Duration::from_millis(200))
        .with_max_elapsed_time(Some(timeout))
        .build();

    backoff::retry(policy, || {
        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) => err,
        backoff::Error::Transient { err, .. } => err,
    })
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read raw bytes from a file.
pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    fs::read(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read at most `limit` bytes from the start of a file.
pub fn read_prefix(path: &NormalizedPath, limit: usize) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    let file = File::open(&native_path).map_err(|e| Error::io(&native_path, e))?;
    let mut buf = Vec::with_capacity(limit.min(64 * 1024));
    file.take(limit as u64)
        .read_to_end(&mut buf)
        .map_err(|e| Error::io(&native_path, e))?;
    Ok(buf)
}

/// Write text content to a file atomically with default robustness settings.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}

/// Last modification time of a file.
pub fn modified_time(path: &NormalizedPath) -> Result<SystemTime> {
    let native_path = path.to_native();
    fs::metadata(&native_path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::io(&native_path, e))
}

/// Copy `from` over `to`, preserving permissions and timestamps.
///
/// The destination is replaced atomically; its access and modification times
/// are then set to those of the source so that newer-wins comparisons see the
/// two sides as equally fresh.
pub fn copy_preserving(from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
    let src = from.to_native();
    let dst = to.to_native();

    let metadata = fs::metadata(&src).map_err(|e| Error::io(&src, e))?;
    let content = fs::read(&src).map_err(|e| Error::io(&src, e))?;

    write_atomic(to, &content, RobustnessConfig::default())?;

    // Times first: a read-only mode must not block the handle below.
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    open_for_times(&dst)
        .and_then(|f| f.set_times(times))
        .map_err(|e| Error::io(&dst, e))?;

    fs::set_permissions(&dst, metadata.permissions()).map_err(|e| Error::io(&dst, e))?;

    Ok(())
}

/// Handle that `set_times` accepts. On unix the owner may set times through a
/// read-only descriptor; Windows wants write access.
fn open_for_times(path: &Path) -> std::io::Result<File> {
    #[cfg(unix)]
    {
        File::open(path)
    }
    #[cfg(not(unix))]
    {
        OpenOptions::new().write(true).open(path)
    }
}
