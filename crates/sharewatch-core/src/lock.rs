//! Process-level mutual exclusion for reconciliation runs.
//!
//! A non-blocking advisory lock on a fixed cache-file path ensures at most
//! one reconciler executes at a time, even when a scheduled trigger and a
//! manual invocation race. The OS releases the lock when the holding file
//! descriptor closes, so a crashed run never permanently blocks future runs.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use fs2::FileExt;

/// Holds the exclusive run lock for the process lifetime.
///
/// Dropping the guard (or process death by any means) releases the lock.
pub struct RunGuard {
    file: File,
}

impl RunGuard {
    /// Attempt a non-blocking exclusive lock on `path`.
    ///
    /// Returns `Ok(Some(guard))` when acquired, `Ok(None)` when another
    /// instance already holds the lock (the caller should exit successfully;
    /// a concurrent run is not an error). There is no retry.
    pub fn acquire(path: &Path) -> io::Result<Option<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        // The descriptor closing would release the lock anyway; the explicit
        // unlock just makes the release immediate and visible.
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_contend() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor.lock");

        let first = RunGuard::acquire(&path).unwrap();
        assert!(first.is_some());

        // A second acquisition while the first guard is held observes
        // contention rather than an error.
        let second = RunGuard::acquire(&path).unwrap();
        assert!(second.is_none());

        // Releasing the first guard makes the lock available again.
        drop(first);
        let third = RunGuard::acquire(&path).unwrap();
        assert!(third.is_some());
    }

    #[test]
    fn test_lock_file_is_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor.lock");

        let guard = RunGuard::acquire(&path).unwrap();
        assert!(guard.is_some());
        assert!(path.exists());
    }
}
