//! The bounded, durable monitor log.
//!
//! Timestamped lines are appended per run; when the file grows past a byte
//! threshold it is truncated to its most recent tail lines. The rewrite goes
//! through a temporary file in the same directory, so an interrupted
//! rotation leaves at worst a harmless orphan that the next successful
//! rotation overwrites.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::LogConfig;

/// Append-only log with truncate-to-tail rotation.
pub struct MonitorLog {
    path: PathBuf,
    max_bytes: u64,
    tail_lines: usize,
}

impl MonitorLog {
    /// Build a log over the given file with the given limits.
    pub fn new(path: impl Into<PathBuf>, limits: &LogConfig) -> Self {
        Self {
            path: path.into(),
            max_bytes: limits.max_bytes,
            tail_lines: limits.tail_lines,
        }
    }

    /// Append a message. Multi-line messages get one timestamped line each.
    pub fn append(&self, message: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        for line in message.lines() {
            writeln!(file, "{timestamp} {line}")?;
        }
        Ok(())
    }

    /// Rotate the log if it exceeds the size threshold, retaining only the
    /// most recent tail lines.
    pub fn rotate_if_needed(&self) -> io::Result<()> {
        let len = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if len <= self.max_bytes {
            return Ok(());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = contents.lines().collect();
        let keep_from = lines.len().saturating_sub(self.tail_lines);

        let dir = self.path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        for line in &lines[keep_from..] {
            writeln!(tmp, "{line}")?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!(
            "rotated monitor log {} ({len} bytes, kept {} lines)",
            self.path.display(),
            lines.len() - keep_from
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn limits(max_bytes: u64, tail_lines: usize) -> LogConfig {
        LogConfig {
            max_bytes,
            tail_lines,
        }
    }

    #[test]
    fn test_append_timestamps_every_line() {
        let dir = TempDir::new().unwrap();
        let log = MonitorLog::new(dir.path().join("monitor.log"), &limits(1024, 10));

        log.append("first\nsecond").unwrap();

        let contents = std::fs::read_to_string(dir.path().join("monitor.log")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first"));
        assert!(lines[1].ends_with("second"));
        // Timestamp prefix present
        assert!(lines[0].len() > "first".len() + 19);
    }

    #[test]
    fn test_rotation_keeps_most_recent_tail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor.log");
        let log = MonitorLog::new(&path, &limits(64, 3));

        for i in 0..20 {
            log.append(&format!("entry number {i}")).unwrap();
        }
        log.rotate_if_needed().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("entry number 17"));
        assert!(lines[2].ends_with("entry number 19"));
    }

    #[test]
    fn test_rotation_noop_below_threshold() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor.log");
        let log = MonitorLog::new(&path, &limits(1024 * 1024, 3));

        log.append("only entry").unwrap();
        log.rotate_if_needed().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[test]
    fn test_rotation_with_no_file() {
        let dir = TempDir::new().unwrap();
        let log = MonitorLog::new(dir.path().join("absent.log"), &limits(64, 3));
        log.rotate_if_needed().unwrap();
    }
}
