//! File-based singleton lock so only one `ReflectionAgent` cycle runs at a
//! time across every process sharing the profiles directory.
//!
//! A plain `fs2` exclusive lock already excludes concurrent live processes,
//! but says nothing about a process that crashed mid-cycle without
//! releasing it (e.g. on a network filesystem). The lock file's mtime
//! doubles as a staleness marker: a lock older than `ttl` is reclaimed.

use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use fs2::FileExt;
use tracing::warn;

use crate::error::ReflectionError;

const LOCK_FILE_NAME: &str = ".reflection.lock";

pub struct ReflectionLockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for ReflectionLockGuard {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            warn!(%err, path = %self.path.display(), "failed to release reflection lock");
        }
    }
}

/// Attempt to acquire the singleton lock in `profiles_dir`. Reclaims a lock
/// file older than `ttl` before trying, then fails with `LockHeld` if
/// another (still-live) process holds it.
pub fn acquire(profiles_dir: &Path, ttl: Duration) -> Result<ReflectionLockGuard, ReflectionError> {
    let path = profiles_dir.join(LOCK_FILE_NAME);

    if let Ok(metadata) = fs::metadata(&path) {
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or_default();
        if age > ttl {
            warn!(path = %path.display(), age_secs = age.as_secs(), "reclaiming stale reflection lock");
            let _ = fs::remove_file(&path);
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&path)?;
    file.try_lock_exclusive().map_err(|_| ReflectionError::LockHeld)?;

    file.set_len(0)?;
    let mut handle = &file;
    handle.write_all(chrono::Utc::now().to_rfc3339().as_bytes())?;

    Ok(ReflectionLockGuard { file, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_first_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let first = acquire(dir.path(), Duration::from_secs(1800)).unwrap();
        let second = acquire(dir.path(), Duration::from_secs(1800));
        assert!(matches!(second, Err(ReflectionError::LockHeld)));
        drop(first);
    }

    #[test]
    fn acquire_succeeds_again_after_release() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _guard = acquire(dir.path(), Duration::from_secs(1800)).unwrap();
        }
        assert!(acquire(dir.path(), Duration::from_secs(1800)).is_ok());
    }

    #[test]
    fn stale_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);
        fs::write(&path, "old").unwrap();
        let stale_time = SystemTime::now() - Duration::from_secs(3600);
        let file = File::open(&path).unwrap();
        file.set_times(fs::FileTimes::new().set_modified(stale_time)).unwrap();

        let guard = acquire(dir.path(), Duration::from_secs(1800));
        assert!(guard.is_ok());
    }
}
