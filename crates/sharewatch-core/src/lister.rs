//! Enumeration of the shares the NAS currently advertises.
//!
//! The production implementation shells out to `smbclient -g -L`, which
//! prints one `type|name|comment` line per share. Only `Disk` entries are
//! kept, and any name containing the hidden-share marker (`$`) is excluded
//! by policy - this also hides a legitimately named user share containing
//! that character, which is intentional and documented rather than fixed.

use std::path::PathBuf;
use std::process::Command;

use crate::config::MonitorConfig;
use crate::shares::{ShareName, ShareSet};

/// Marker character flagging administrative/hidden shares.
const HIDDEN_SHARE_MARKER: char = '$';

/// Queries an external NAS for the set of currently exposed share names.
pub trait ShareLister {
    /// List the non-administrative shares the NAS advertises.
    ///
    /// An authentication or transport failure is an explicit error, distinct
    /// from an empty-but-successful result.
    fn list_available(&self) -> Result<ShareSet, ListError>;
}

/// Errors while enumerating NAS shares.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    /// The listing utility could not be spawned at all.
    #[error("failed to run smbclient: {0}")]
    Spawn(#[from] std::io::Error),

    /// The NAS rejected the stored credentials.
    #[error("authentication failed listing shares on {host}: {detail}")]
    AuthFailed {
        /// NAS host that rejected the credentials.
        host: String,
        /// Diagnostic output from the listing utility.
        detail: String,
    },

    /// The listing utility failed for a non-authentication reason.
    #[error("failed to list shares on {host}: {detail}")]
    Transport {
        /// NAS host that was queried.
        host: String,
        /// Diagnostic output from the listing utility.
        detail: String,
    },
}

/// [`ShareLister`] backed by the `smbclient` utility.
pub struct SmbclientLister {
    host: String,
    credentials_file: PathBuf,
}

impl SmbclientLister {
    /// Build a lister for the configured NAS.
    pub fn new(config: &MonitorConfig) -> Self {
        let lister = Self {
            host: config.host.clone(),
            credentials_file: config.credentials_file(),
        };
        lister.warn_on_loose_permissions();
        lister
    }

    /// Warn when the credentials file is readable by other users. Listing
    /// proceeds regardless; this is hygiene feedback, not enforcement.
    #[cfg(unix)]
    fn warn_on_loose_permissions(&self) {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(meta) = std::fs::metadata(&self.credentials_file) {
            let mode = meta.permissions().mode();
            if mode & 0o044 != 0 {
                tracing::warn!(
                    "credentials file {} is readable by other users (mode {:o})",
                    self.credentials_file.display(),
                    mode & 0o777
                );
            }
        }
    }

    #[cfg(not(unix))]
    fn warn_on_loose_permissions(&self) {}
}

impl ShareLister for SmbclientLister {
    fn list_available(&self) -> Result<ShareSet, ListError> {
        let output = Command::new("smbclient")
            .arg("-g")
            .arg("-L")
            .arg(&self.host)
            .arg("-A")
            .arg(&self.credentials_file)
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let detail = first_diagnostic_line(&stderr, &stdout);
            if is_auth_failure(&stderr) || is_auth_failure(&stdout) {
                return Err(ListError::AuthFailed {
                    host: self.host.clone(),
                    detail,
                });
            }
            return Err(ListError::Transport {
                host: self.host.clone(),
                detail,
            });
        }

        Ok(parse_share_listing(&stdout))
    }
}

/// Parse `smbclient -g` grepable output into a share set.
///
/// Lines have the form `type|name|comment`. Non-`Disk` entries (printers,
/// IPC endpoints) and names carrying the hidden-share marker are dropped.
pub fn parse_share_listing(output: &str) -> ShareSet {
    let mut shares = ShareSet::new();

    for line in output.lines() {
        let mut fields = line.splitn(3, '|');
        let (Some(kind), Some(name)) = (fields.next(), fields.next()) else {
            continue;
        };
        if kind != "Disk" {
            continue;
        }
        if name.contains(HIDDEN_SHARE_MARKER) {
            tracing::debug!("skipping hidden share {name:?}");
            continue;
        }
        match name.parse::<ShareName>() {
            Ok(share) => {
                shares.insert(share);
            }
            Err(_) => {
                tracing::debug!("skipping share with unusable name {name:?}");
            }
        }
    }

    shares
}

/// Whether diagnostic output indicates a credentials problem.
fn is_auth_failure(text: &str) -> bool {
    text.contains("NT_STATUS_LOGON_FAILURE")
        || text.contains("NT_STATUS_ACCESS_DENIED")
        || text.contains("NT_STATUS_ACCOUNT_DISABLED")
}

/// Pick the most useful single line to surface in an error message.
fn first_diagnostic_line(stderr: &str, stdout: &str) -> String {
    stderr
        .lines()
        .chain(stdout.lines())
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no diagnostic output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Disk|Documents|User documents
Disk|Media|Movies and music
Disk|admin$|Administrative share
IPC|IPC$|IPC Service (NAS)
Printer|office-laser|HP LaserJet
Disk|Backups|
";

    #[test]
    fn test_parse_keeps_disk_shares_only() {
        let shares = parse_share_listing(SAMPLE);
        assert_eq!(shares.len(), 3);
        assert!(shares.contains(&"Documents".parse().unwrap()));
        assert!(shares.contains(&"Media".parse().unwrap()));
        assert!(shares.contains(&"Backups".parse().unwrap()));
    }

    #[test]
    fn test_parse_filters_hidden_marker() {
        let shares = parse_share_listing("Disk|secret$|hidden\nDisk|Public|\n");
        assert_eq!(shares.len(), 1);
        assert!(shares.contains(&"Public".parse().unwrap()));
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_share_listing("").is_empty());
        assert!(parse_share_listing("Anonymous login successful\n").is_empty());
    }

    #[test]
    fn test_auth_failure_detection() {
        assert!(is_auth_failure(
            "session setup failed: NT_STATUS_LOGON_FAILURE"
        ));
        assert!(!is_auth_failure("Connection to nas failed (Error NT_STATUS_IO_TIMEOUT)"));
    }

    #[test]
    fn test_first_diagnostic_line_prefers_stderr() {
        let line = first_diagnostic_line("\n  real error here\n", "stdout noise");
        assert_eq!(line, "real error here");
        assert_eq!(first_diagnostic_line("", ""), "no diagnostic output");
    }
}
