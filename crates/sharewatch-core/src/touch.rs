//! Advisory access probes against on-demand mount paths.
//!
//! Touching a share's mount path nudges the automounter into mounting it.
//! A share whose backing mount hangs must not stall the run, so each probe
//! runs on its own thread with a short timeout; failures are ignored
//! entirely - this step is advisory, not load-bearing.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use crate::shares::ShareSet;

/// Probe every configured share's mount path with a bounded per-share
/// timeout. Returns how many probes answered in time (for logging only).
pub fn touch_mounts(mount_root: &Path, configured: &ShareSet, timeout: Duration) -> usize {
    let mut responsive = 0;
    for share in configured.iter() {
        let path = mount_root.join(share.as_str());
        if probe_path(&path, timeout) {
            responsive += 1;
        } else {
            tracing::debug!("mount touch got no answer for {}", path.display());
        }
    }
    responsive
}

/// Stat a path on a separate thread so a hung mount cannot block the caller.
fn probe_path(path: &Path, timeout: Duration) -> bool {
    let path = path.to_path_buf();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let result = std::fs::metadata(&path).is_ok();
        let _ = tx.send(result);
    });

    rx.recv_timeout(timeout).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set(names: &[&str]) -> ShareSet {
        names.iter().map(|n| n.parse().unwrap()).collect()
    }

    #[test]
    fn test_touch_counts_existing_paths() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("Documents")).unwrap();
        std::fs::create_dir(root.path().join("Media")).unwrap();

        let configured = set(&["Documents", "Media", "Missing"]);
        let responsive =
            touch_mounts(root.path(), &configured, Duration::from_millis(500));
        assert_eq!(responsive, 2);
    }

    #[test]
    fn test_touch_empty_set() {
        let root = TempDir::new().unwrap();
        assert_eq!(
            touch_mounts(root.path(), &ShareSet::new(), Duration::from_millis(100)),
            0
        );
    }
}
