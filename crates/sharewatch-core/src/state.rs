//! Persistence of the last-reported mismatch fingerprint.
//!
//! A single file in the cache directory holds one opaque token. Absence of
//! the file is the valid "no prior mismatch recorded" condition, not an
//! error. Updates are atomic (write to a temporary file in the same
//! directory, then rename over the target).

use std::io;
use std::io::Write;
use std::path::PathBuf;

use crate::shares::Fingerprint;

/// Compare-and-update storage for the last-reported mismatch fingerprint.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Build a store over the given fingerprint file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted fingerprint, if any.
    pub fn read(&self) -> io::Result<Option<Fingerprint>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Fingerprint(token.to_string())))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Persist a fingerprint, replacing any previous value atomically.
    pub fn write(&self, fingerprint: &Fingerprint) -> io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        writeln!(tmp, "{fingerprint}")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Delete any persisted fingerprint. Deleting an absent file is not an
    /// error.
    pub fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absent_file_reads_none() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("last-mismatch"));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("last-mismatch"));

        let fp = Fingerprint("abc123".to_string());
        store.write(&fp).unwrap();
        assert_eq!(store.read().unwrap(), Some(fp.clone()));

        // Overwrite replaces the value
        let fp2 = Fingerprint("def456".to_string());
        store.write(&fp2).unwrap();
        assert_eq!(store.read().unwrap(), Some(fp2));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("last-mismatch"));

        store.write(&Fingerprint("abc".to_string())).unwrap();
        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);

        // Clearing an already-absent file succeeds
        store.clear().unwrap();
    }
}
