//! The reconciliation state machine.
//!
//! One run proceeds strictly in order: rotate the log, wait for the NAS to
//! be reachable, fetch both share sets, diff them, conditionally notify
//! (deduplicated against the persisted fingerprint), then touch the
//! configured mount paths. The component holds no in-memory state between
//! runs - everything cross-run lives in the [`StateStore`] - and runs are
//! serialized externally by the run lock, so the read-then-write on the
//! fingerprint is race-free.

use crate::config::MonitorConfig;
use crate::lister::{ListError, ShareLister};
use crate::mapfile::ConfigReader;
use crate::monitor_log::MonitorLog;
use crate::net;
use crate::notify::{NotificationSink, Urgency};
use crate::shares::MismatchReport;
use crate::state::StateStore;
use crate::touch;

/// How a successful run concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Configured and advertised shares match.
    Clean,
    /// A mismatch was found and a notification was issued.
    MismatchReported(MismatchReport),
    /// The same mismatch was already reported by an earlier run.
    MismatchSuppressed(MismatchReport),
}

/// The three fatal paths of a run.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The NAS did not answer on its SMB port within the polling budget.
    #[error("NAS {host}:{port} unreachable within the polling budget")]
    Unreachable {
        /// NAS host that was probed.
        host: String,
        /// Port that was probed.
        port: u16,
    },

    /// Share enumeration failed (authentication or transport).
    #[error(transparent)]
    List(#[from] ListError),

    /// Enumeration succeeded but returned zero shares - likely a
    /// credentials or configuration problem rather than an outage.
    #[error("NAS {host} advertises no shares; check credentials")]
    NoSharesVisible {
        /// NAS host that was queried.
        host: String,
    },
}

/// Orchestrates one reconciliation run.
pub struct Reconciler<'a> {
    config: &'a MonitorConfig,
    lister: &'a dyn ShareLister,
    reader: &'a dyn ConfigReader,
    sink: &'a dyn NotificationSink,
    state: StateStore,
    log: MonitorLog,
}

impl<'a> Reconciler<'a> {
    /// Wire up a reconciler from the configuration and its collaborators.
    pub fn new(
        config: &'a MonitorConfig,
        lister: &'a dyn ShareLister,
        reader: &'a dyn ConfigReader,
        sink: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            config,
            lister,
            reader,
            sink,
            state: StateStore::new(config.state_path()),
            log: MonitorLog::new(config.log_path(), &config.log),
        }
    }

    /// Execute one reconciliation pass.
    pub fn run(&self) -> Result<RunOutcome, ReconcileError> {
        if let Err(e) = self.log.rotate_if_needed() {
            tracing::warn!("log rotation failed: {e}");
        }

        let host = &self.config.host;
        let port = self.config.port;

        if !net::wait_for_reachable(host, port, &self.config.probe) {
            let message = format!("NAS {host} is unreachable on port {port}");
            self.sink
                .notify(Urgency::Critical, "NAS unreachable", &message);
            self.log_line(&message);
            return Err(ReconcileError::Unreachable {
                host: host.clone(),
                port,
            });
        }

        let configured = self.reader.list_configured();
        let available = match self.lister.list_available() {
            Ok(available) => available,
            Err(e) => {
                self.sink.notify(
                    Urgency::Critical,
                    "Failed to list NAS shares",
                    "Could not enumerate shares; check credentials and the monitor log.",
                );
                self.log_line(&format!("share listing failed: {e}"));
                return Err(e.into());
            }
        };

        if available.is_empty() {
            self.sink.notify(
                Urgency::Warning,
                "NAS advertises no shares",
                "The share listing succeeded but came back empty; this usually means a credentials problem.",
            );
            self.log_line("share listing was empty; treating as misconfiguration");
            return Err(ReconcileError::NoSharesVisible { host: host.clone() });
        }

        tracing::info!(
            "comparing {} configured against {} advertised shares",
            configured.len(),
            available.len()
        );

        let report = MismatchReport::compare(&configured, &available);
        let outcome = if report.is_empty() {
            if let Err(e) = self.state.clear() {
                tracing::warn!("failed to clear mismatch state: {e}");
            }
            self.log_line("all shares match");
            RunOutcome::Clean
        } else {
            self.handle_mismatch(report)
        };

        let responsive = touch::touch_mounts(
            &self.config.mount_root,
            &configured,
            self.config.touch_timeout(),
        );
        tracing::debug!(
            "touched {} configured mounts, {responsive} responded",
            configured.len()
        );

        Ok(outcome)
    }

    /// Notify about a non-empty report unless the identical report was
    /// already notified by an earlier run.
    fn handle_mismatch(&self, report: MismatchReport) -> RunOutcome {
        let fingerprint = report.fingerprint();
        let prior = match self.state.read() {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!("failed to read mismatch state: {e}");
                None
            }
        };

        if prior.as_ref() == Some(&fingerprint) {
            tracing::info!("mismatch unchanged since last report, suppressing notification");
            return RunOutcome::MismatchSuppressed(report);
        }

        // Persist first: a duplicate notification after a failed write is
        // better than re-notifying on every run.
        if let Err(e) = self.state.write(&fingerprint) {
            tracing::warn!("failed to persist mismatch state: {e}");
        }

        let body = render_mismatch(&report);
        self.sink
            .notify(Urgency::Normal, "NAS share mismatch", &body);
        self.log_line(&format!("share mismatch detected\n{body}"));

        RunOutcome::MismatchReported(report)
    }

    fn log_line(&self, message: &str) {
        if let Err(e) = self.log.append(message) {
            tracing::warn!("failed to append to monitor log: {e}");
        }
    }
}

/// Render the mismatch as the notification body: each direction as a
/// header plus a bulleted sub-list, empty directions omitted.
pub fn render_mismatch(report: &MismatchReport) -> String {
    let mut sections = Vec::new();
    if !report.missing_on_nas.is_empty() {
        sections.push(format!(
            "Configured but absent on NAS:\n{}",
            report.missing_on_nas.bulleted()
        ));
    }
    if !report.extra_on_nas.is_empty() {
        sections.push(format!(
            "Present on NAS but not configured:\n{}",
            report.extra_on_nas.bulleted()
        ));
    }
    sections.join("\n")
}
