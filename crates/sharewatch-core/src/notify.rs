//! Best-effort desktop notification delivery.
//!
//! Delivery requires a live desktop session. Discovery is a ranked sequence
//! of strategies (session bus already in the environment, then the per-user
//! runtime bus socket, then give up), each returning an optional context.
//! All of this stays inside the adapter - the reconciler only sees
//! `notify(..) -> delivered`, and a failed delivery is never an error.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Notification urgency, as surfaced to the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Routine information (a mismatch report).
    Normal,
    /// Something looks wrong but the run could assess it (empty listing).
    Warning,
    /// The run could not do its job (unreachable NAS, listing failure).
    Critical,
}

impl Urgency {
    /// Map to the urgency level understood by `notify-send`.
    ///
    /// `notify-send` has no warning level, so warnings are delivered at
    /// normal urgency; the distinction is kept at the API seam.
    pub fn cli_arg(self) -> &'static str {
        match self {
            Self::Normal | Self::Warning => "normal",
            Self::Critical => "critical",
        }
    }
}

/// Delivers a human-readable message to the desktop session.
pub trait NotificationSink {
    /// Deliver a notification. Returns whether delivery appeared to succeed;
    /// never raises a fatal error to the caller.
    fn notify(&self, urgency: Urgency, title: &str, body: &str) -> bool;
}

/// Display variable a session exposes, keeping track of which protocol the
/// value belongs to so it is re-exported under the right name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayVar {
    /// An X11 `DISPLAY` value (e.g. `:0`).
    X11(OsString),
    /// A `WAYLAND_DISPLAY` value (e.g. `wayland-0`).
    Wayland(OsString),
}

impl DisplayVar {
    /// Environment variable name the value must be exported under.
    pub fn key(&self) -> &'static str {
        match self {
            Self::X11(_) => "DISPLAY",
            Self::Wayland(_) => "WAYLAND_DISPLAY",
        }
    }

    /// The display value itself.
    pub fn value(&self) -> &OsString {
        match self {
            Self::X11(v) | Self::Wayland(v) => v,
        }
    }
}

/// Environment needed to reach the desktop notification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// `DBUS_SESSION_BUS_ADDRESS` value to use.
    pub bus_address: OsString,
    /// Display variable to export alongside the bus address, when known.
    pub display: Option<DisplayVar>,
}

/// Take the session context from the calling environment, if complete.
fn session_from_env(get: impl Fn(&str) -> Option<OsString>) -> Option<SessionContext> {
    let bus_address = get("DBUS_SESSION_BUS_ADDRESS")?;
    let display = get("DISPLAY")
        .map(DisplayVar::X11)
        .or_else(|| get("WAYLAND_DISPLAY").map(DisplayVar::Wayland));
    Some(SessionContext {
        bus_address,
        display,
    })
}

/// Derive a session context from the per-user runtime directory, used when
/// the monitor runs outside the graphical session (e.g. from a timer).
fn session_from_runtime_dir(uid: u32, runtime_root: &Path) -> Option<SessionContext> {
    let bus_path = runtime_root.join(uid.to_string()).join("bus");
    if !bus_path.exists() {
        return None;
    }
    let mut bus_address = OsString::from("unix:path=");
    bus_address.push(&bus_path);
    Some(SessionContext {
        bus_address,
        // Display unknown from here; the notification daemon listens on the
        // bus, so this is enough for delivery.
        display: None,
    })
}

/// Discover a live desktop session via the ranked strategies.
pub fn discover_session() -> Option<SessionContext> {
    if let Some(ctx) = session_from_env(|k| std::env::var_os(k)) {
        return Some(ctx);
    }

    #[cfg(unix)]
    {
        let uid = nix::unistd::Uid::effective().as_raw();
        if let Some(ctx) = session_from_runtime_dir(uid, Path::new("/run/user")) {
            return Some(ctx);
        }
    }

    None
}

/// [`NotificationSink`] delivering via `notify-send`.
pub struct DesktopNotifier {
    timeout_ms: u32,
}

impl DesktopNotifier {
    /// Build a notifier with the given display timeout.
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

impl NotificationSink for DesktopNotifier {
    fn notify(&self, urgency: Urgency, title: &str, body: &str) -> bool {
        let Some(session) = discover_session() else {
            tracing::info!("no desktop session discoverable, skipping notification: {title}");
            return false;
        };

        let mut env: HashMap<&str, OsString> = HashMap::new();
        env.insert("DBUS_SESSION_BUS_ADDRESS", session.bus_address);
        if let Some(display) = session.display {
            env.insert(display.key(), display.value().clone());
        }

        let result = Command::new("notify-send")
            .arg("-u")
            .arg(urgency.cli_arg())
            .arg("-t")
            .arg(self.timeout_ms.to_string())
            .arg("-a")
            .arg("sharewatch")
            .arg(title)
            .arg(body)
            .envs(env)
            .output();

        match result {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!("notify-send failed: {}", stderr.trim());
                false
            }
            Err(e) => {
                tracing::warn!("failed to run notify-send: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_urgency_mapping() {
        assert_eq!(Urgency::Normal.cli_arg(), "normal");
        assert_eq!(Urgency::Warning.cli_arg(), "normal");
        assert_eq!(Urgency::Critical.cli_arg(), "critical");
    }

    #[test]
    fn test_session_from_env_requires_bus() {
        let env: HashMap<&str, &str> =
            [("DISPLAY", ":0")].into_iter().collect();
        let ctx = session_from_env(|k| env.get(k).map(OsString::from));
        assert!(ctx.is_none());
    }

    #[test]
    fn test_session_from_env_complete() {
        let env: HashMap<&str, &str> = [
            ("DBUS_SESSION_BUS_ADDRESS", "unix:path=/run/user/1000/bus"),
            ("DISPLAY", ":0"),
        ]
        .into_iter()
        .collect();

        let ctx = session_from_env(|k| env.get(k).map(OsString::from)).unwrap();
        assert_eq!(ctx.bus_address, OsString::from("unix:path=/run/user/1000/bus"));
        assert_eq!(ctx.display, Some(DisplayVar::X11(OsString::from(":0"))));
    }

    #[test]
    fn test_session_from_env_wayland_only() {
        let env: HashMap<&str, &str> = [
            ("DBUS_SESSION_BUS_ADDRESS", "unix:path=/run/user/1000/bus"),
            ("WAYLAND_DISPLAY", "wayland-0"),
        ]
        .into_iter()
        .collect();

        let ctx = session_from_env(|k| env.get(k).map(OsString::from)).unwrap();
        let display = ctx.display.unwrap();
        // A Wayland value must not surface under the X11 variable.
        assert_eq!(display.key(), "WAYLAND_DISPLAY");
        assert_eq!(display.value(), &OsString::from("wayland-0"));
    }

    #[test]
    fn test_x11_display_preferred_over_wayland() {
        let env: HashMap<&str, &str> = [
            ("DBUS_SESSION_BUS_ADDRESS", "unix:path=/run/user/1000/bus"),
            ("DISPLAY", ":0"),
            ("WAYLAND_DISPLAY", "wayland-0"),
        ]
        .into_iter()
        .collect();

        let ctx = session_from_env(|k| env.get(k).map(OsString::from)).unwrap();
        assert_eq!(ctx.display, Some(DisplayVar::X11(OsString::from(":0"))));
    }

    #[test]
    fn test_session_from_runtime_dir() {
        let root = TempDir::new().unwrap();
        assert!(session_from_runtime_dir(1000, root.path()).is_none());

        let user_dir = root.path().join("1000");
        std::fs::create_dir(&user_dir).unwrap();
        std::fs::write(user_dir.join("bus"), b"").unwrap();

        let ctx = session_from_runtime_dir(1000, root.path()).unwrap();
        let expected: PathBuf = user_dir.join("bus");
        let mut want = OsString::from("unix:path=");
        want.push(&expected);
        assert_eq!(ctx.bus_address, want);
        assert!(ctx.display.is_none());
    }
}
