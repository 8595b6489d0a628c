//! Core library for the sharewatch monitor.
//!
//! sharewatch watches for drift between the SMB shares a user has
//! configured for on-demand mounting and the shares their NAS actually
//! advertises. The library provides the complete reconciliation machinery;
//! the `sharewatch` binary wires it to a CLI.
//!
//! # Components
//!
//! - [`MonitorConfig`] - explicit configuration, constructed once at process
//!   start and passed by reference into everything else
//! - [`ShareLister`] / [`SmbclientLister`] - enumeration of advertised shares
//! - [`ConfigReader`] / [`AutofsMapReader`] - the locally configured set
//! - [`NotificationSink`] / [`DesktopNotifier`] - best-effort desktop
//!   notifications
//! - [`StateStore`] - persisted fingerprint backing duplicate suppression
//! - [`RunGuard`] - process-level mutual exclusion between runs
//! - [`MonitorLog`] - bounded, durable log with truncate-to-tail rotation
//! - [`Reconciler`] - the per-run state machine tying it all together
//!
//! # One run
//!
//! ```no_run
//! use sharewatch_core::{
//!     AutofsMapReader, DesktopNotifier, MonitorConfig, Reconciler, RunGuard,
//!     SmbclientLister,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::load()?;
//! std::fs::create_dir_all(&config.cache_dir)?;
//!
//! let Some(_guard) = RunGuard::acquire(&config.lock_path())? else {
//!     // Another run is already in progress; not an error.
//!     return Ok(());
//! };
//!
//! let lister = SmbclientLister::new(&config);
//! let reader = AutofsMapReader::new(config.map_file());
//! let sink = DesktopNotifier::new(config.notify_timeout_ms);
//!
//! let outcome = Reconciler::new(&config, &lister, &reader, &sink).run()?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod lister;
pub mod lock;
pub mod mapfile;
pub mod monitor_log;
pub mod net;
pub mod notify;
pub mod reconciler;
pub mod shares;
pub mod state;
pub mod touch;

pub use config::{ConfigError, LogConfig, MonitorConfig, ProbeConfig, CACHE_DIR_ENV, CONFIG_DIR_ENV};
pub use lister::{parse_share_listing, ListError, ShareLister, SmbclientLister};
pub use lock::RunGuard;
pub use mapfile::{parse_share_map, AutofsMapReader, ConfigReader};
pub use monitor_log::MonitorLog;
pub use net::wait_for_reachable;
pub use notify::{
    discover_session, DesktopNotifier, DisplayVar, NotificationSink, SessionContext, Urgency,
};
pub use reconciler::{render_mismatch, ReconcileError, Reconciler, RunOutcome};
pub use shares::{Fingerprint, InvalidShareName, MismatchReport, ShareName, ShareSet};
pub use state::StateStore;
pub use touch::touch_mounts;
