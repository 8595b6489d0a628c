//! Reading the locally configured share map.
//!
//! The map is an autofs-style flat file: one entry per line, keyed by share
//! name (the first whitespace-delimited token), with mount options in the
//! remainder of the line. Comment lines start with `#`; blank lines are
//! ignored. By contract this reader never fails - a missing or unreadable
//! map yields an empty set (the installer validates the map upstream).

use std::path::PathBuf;

use crate::shares::{ShareName, ShareSet};

/// Reads the set of share names the user has configured.
pub trait ConfigReader {
    /// List the configured share names. Infallible by contract.
    fn list_configured(&self) -> ShareSet;
}

/// [`ConfigReader`] backed by a flat map file.
pub struct AutofsMapReader {
    map_file: PathBuf,
}

impl AutofsMapReader {
    /// Build a reader over the given map file.
    pub fn new(map_file: impl Into<PathBuf>) -> Self {
        Self {
            map_file: map_file.into(),
        }
    }
}

impl ConfigReader for AutofsMapReader {
    fn list_configured(&self) -> ShareSet {
        match std::fs::read_to_string(&self.map_file) {
            Ok(contents) => parse_share_map(&contents),
            Err(e) => {
                tracing::debug!(
                    "share map {} not readable ({e}), treating as empty",
                    self.map_file.display()
                );
                ShareSet::new()
            }
        }
    }
}

/// Extract the share-name keys from map file contents.
pub fn parse_share_map(contents: &str) -> ShareSet {
    let mut shares = ShareSet::new();

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(key) = line.split_whitespace().next() else {
            continue;
        };
        match key.parse::<ShareName>() {
            Ok(share) => {
                shares.insert(share);
            }
            Err(_) => {
                tracing::debug!("skipping map entry with invalid key {key:?}");
            }
        }
    }

    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let map = "\
# Shares configured by the installer
Documents -fstype=cifs,rw ://nas/Documents

Media -fstype=cifs,ro ://nas/Media
  # indented comment
";
        let shares = parse_share_map(map);
        assert_eq!(shares.len(), 2);
        assert!(shares.contains(&"Documents".parse().unwrap()));
        assert!(shares.contains(&"Media".parse().unwrap()));
    }

    #[test]
    fn test_parse_first_token_is_key() {
        let shares = parse_share_map("Backups whatever else on the line\n");
        assert_eq!(shares.len(), 1);
        assert!(shares.contains(&"Backups".parse().unwrap()));
    }

    #[test]
    fn test_missing_file_yields_empty_set() {
        let dir = TempDir::new().unwrap();
        let reader = AutofsMapReader::new(dir.path().join("absent.map"));
        assert!(reader.list_configured().is_empty());
    }

    #[test]
    fn test_read_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shares.map");
        std::fs::write(&path, "Documents -fstype=cifs\n# done\n").unwrap();

        let shares = AutofsMapReader::new(&path).list_configured();
        assert_eq!(shares.len(), 1);
    }
}
