//! Monitor configuration.
//!
//! Configuration is an explicit struct constructed once at process start and
//! passed by reference into the reconciler and its adapters - there are no
//! ambient globals. Values come from `config.toml` under the platform config
//! directory (overridable via `SHAREWATCH_CONFIG_DIR`, used by tests), with
//! serde defaults for everything the file omits.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "SHAREWATCH_CONFIG_DIR";

/// Environment variable overriding the cache directory (lock, state, log).
pub const CACHE_DIR_ENV: &str = "SHAREWATCH_CACHE_DIR";

/// Complete configuration for one monitor process.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Hostname or address of the NAS.
    #[serde(default = "default_host")]
    pub host: String,

    /// SMB port probed for reachability.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Credentials file handed to the share-listing utility.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,

    /// Flat map of configured shares (share name is the first token per line).
    #[serde(default)]
    pub map_file: Option<PathBuf>,

    /// Root under which the automounter exposes the shares.
    #[serde(default = "default_mount_root")]
    pub mount_root: PathBuf,

    /// Connectivity probe budget.
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Bounded monitor log limits.
    #[serde(default)]
    pub log: LogConfig,

    /// Per-share timeout for the advisory mount touch, in milliseconds.
    #[serde(default = "default_touch_timeout_ms")]
    pub touch_timeout_ms: u64,

    /// Desktop notification display timeout, in milliseconds.
    #[serde(default = "default_notify_timeout_ms")]
    pub notify_timeout_ms: u32,

    /// Directory holding the lock, fingerprint, and log files.
    ///
    /// Not read from the config file; resolved from the platform cache
    /// directory (or `SHAREWATCH_CACHE_DIR`) at load time.
    #[serde(skip)]
    pub cache_dir: PathBuf,

    /// Directory the configuration was loaded from.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

/// Connectivity probe parameters (default budget ~60 seconds total).
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Maximum number of TCP probes before giving up.
    #[serde(default = "default_probe_attempts")]
    pub max_attempts: u32,

    /// Pause between consecutive probes, in seconds.
    #[serde(default = "default_probe_interval_secs")]
    pub interval_secs: u64,

    /// Timeout for a single probe, in seconds.
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_probe_attempts(),
            interval_secs: default_probe_interval_secs(),
            timeout_secs: default_probe_timeout_secs(),
        }
    }
}

impl ProbeConfig {
    /// Pause between probes.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-probe connect timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Limits for the bounded monitor log.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Byte threshold above which the log is rotated.
    #[serde(default = "default_log_max_bytes")]
    pub max_bytes: u64,

    /// Number of most-recent lines retained after rotation.
    #[serde(default = "default_log_tail_lines")]
    pub tail_lines: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_log_max_bytes(),
            tail_lines: default_log_tail_lines(),
        }
    }
}

fn default_host() -> String {
    "nas.local".to_string()
}

fn default_port() -> u16 {
    445
}

fn default_mount_root() -> PathBuf {
    PathBuf::from("/mnt/nas")
}

fn default_touch_timeout_ms() -> u64 {
    500
}

fn default_notify_timeout_ms() -> u32 {
    30_000
}

fn default_probe_attempts() -> u32 {
    20
}

fn default_probe_interval_secs() -> u64 {
    3
}

fn default_probe_timeout_secs() -> u64 {
    2
}

fn default_log_max_bytes() -> u64 {
    64 * 1024
}

fn default_log_tail_lines() -> usize {
    500
}

/// Errors while resolving or parsing the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Platform config/cache directories could not be determined.
    #[error("failed to determine platform config directory")]
    NoProjectDirs,

    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file exists but is not valid TOML.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying TOML error.
        source: Box<toml::de::Error>,
    },
}

impl MonitorConfig {
    /// Load configuration from `config.toml` in the resolved config
    /// directory, falling back to defaults when the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let (config_dir, cache_dir) = resolve_dirs()?;
        Self::load_from(&config_dir, &cache_dir)
    }

    /// Load configuration from an explicit config file, bypassing directory
    /// resolution for the file itself. Unlike [`MonitorConfig::load`], the
    /// file must exist. Relative defaults (credentials, share map) resolve
    /// next to the given file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

        let (_, cache_dir) = resolve_dirs()?;
        config.config_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        config.cache_dir = cache_dir;
        Ok(config)
    }

    /// Load configuration from an explicit directory pair.
    pub fn load_from(config_dir: &Path, cache_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join("config.toml");

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source: Box::new(source),
            })?
        } else {
            tracing::debug!("no config file at {}, using defaults", path.display());
            toml::from_str::<Self>("").map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source: Box::new(source),
            })?
        };

        config.config_dir = config_dir.to_path_buf();
        config.cache_dir = cache_dir.to_path_buf();
        Ok(config)
    }

    /// Effective credentials file path (defaults to `credentials` in the
    /// config directory).
    pub fn credentials_file(&self) -> PathBuf {
        self.credentials_file
            .clone()
            .unwrap_or_else(|| self.config_dir.join("credentials"))
    }

    /// Effective map file path (defaults to `shares.map` in the config
    /// directory).
    pub fn map_file(&self) -> PathBuf {
        self.map_file
            .clone()
            .unwrap_or_else(|| self.config_dir.join("shares.map"))
    }

    /// Path of the lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.cache_dir.join("monitor.lock")
    }

    /// Path of the persisted fingerprint.
    pub fn state_path(&self) -> PathBuf {
        self.cache_dir.join("last-mismatch")
    }

    /// Path of the bounded monitor log.
    pub fn log_path(&self) -> PathBuf {
        self.cache_dir.join("monitor.log")
    }

    /// Per-share mount touch timeout.
    pub fn touch_timeout(&self) -> Duration {
        Duration::from_millis(self.touch_timeout_ms)
    }
}

/// Resolve config and cache directories, honoring the env overrides.
fn resolve_dirs() -> Result<(PathBuf, PathBuf), ConfigError> {
    let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => directories::ProjectDirs::from("com", "sharewatch", "sharewatch")
            .ok_or(ConfigError::NoProjectDirs)?
            .config_dir()
            .to_path_buf(),
    };

    let cache_dir = match std::env::var_os(CACHE_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => directories::ProjectDirs::from("com", "sharewatch", "sharewatch")
            .ok_or(ConfigError::NoProjectDirs)?
            .cache_dir()
            .to_path_buf(),
    };

    Ok((config_dir, cache_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let config = MonitorConfig::load_from(dir.path(), dir.path()).unwrap();

        assert_eq!(config.port, 445);
        assert_eq!(config.probe.max_attempts, 20);
        assert_eq!(config.log.tail_lines, 500);
        assert_eq!(config.credentials_file(), dir.path().join("credentials"));
        assert_eq!(config.map_file(), dir.path().join("shares.map"));
    }

    #[test]
    fn test_partial_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "host = \"tower\"\n\n[probe]\nmax_attempts = 3\n",
        )
        .unwrap();

        let config = MonitorConfig::load_from(dir.path(), dir.path()).unwrap();
        assert_eq!(config.host, "tower");
        assert_eq!(config.probe.max_attempts, 3);
        // Unspecified values fall back to defaults
        assert_eq!(config.probe.interval_secs, 3);
        assert_eq!(config.port, 445);
    }

    #[test]
    fn test_load_file_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        let err = MonitorConfig::load_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_file_resolves_relative_defaults_beside_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alt.toml");
        std::fs::write(&path, "host = \"tower\"\n").unwrap();

        // Isolate from the platform cache dir.
        // SAFETY: test process env, no concurrent reader of this variable.
        unsafe { std::env::set_var(CACHE_DIR_ENV, dir.path()) };
        let config = MonitorConfig::load_file(&path).unwrap();
        unsafe { std::env::remove_var(CACHE_DIR_ENV) };

        assert_eq!(config.host, "tower");
        assert_eq!(config.config_dir, dir.path());
        assert_eq!(config.cache_dir, dir.path());
        assert_eq!(config.credentials_file(), dir.path().join("credentials"));
    }

    #[test]
    fn test_invalid_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "host = [not toml").unwrap();

        let err = MonitorConfig::load_from(dir.path(), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
