//! Connectivity gate for the reconciler.
//!
//! Reachability is defined purely in terms of the application's own
//! transport port (ICMP is commonly filtered on home networks), so the
//! probe is a raw TCP connect to the SMB port. Each probe carries its own
//! short timeout so a single hung attempt cannot stall the loop.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::ProbeConfig;

/// Poll a TCP reachability probe until it succeeds or the budget runs out.
///
/// Returns `true` on the first successful connect, `false` after
/// `max_attempts` probes with no success. This is a precondition gate only;
/// it does not retry the enumeration calls themselves.
pub fn wait_for_reachable(host: &str, port: u16, probe: &ProbeConfig) -> bool {
    for attempt in 1..=probe.max_attempts {
        if probe_once(host, port, probe.timeout()) {
            tracing::debug!("{host}:{port} reachable on attempt {attempt}");
            return true;
        }
        if attempt < probe.max_attempts {
            std::thread::sleep(probe.interval());
        }
    }

    tracing::warn!(
        "{host}:{port} unreachable after {} attempts",
        probe.max_attempts
    );
    false
}

/// One bounded connect attempt. Name resolution happens per attempt, since
/// DNS may come up later than the link.
fn probe_once(host: &str, port: u16, timeout: Duration) -> bool {
    let addrs = match (host, port).to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            tracing::debug!("failed to resolve {host}: {e}");
            return false;
        }
    };

    for addr in addrs {
        if TcpStream::connect_timeout(&addr, timeout).is_ok() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn quick_probe(attempts: u32) -> ProbeConfig {
        ProbeConfig {
            max_attempts: attempts,
            interval_secs: 0,
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(wait_for_reachable("127.0.0.1", port, &quick_probe(1)));
    }

    #[test]
    fn test_unreachable_port() {
        // Bind then drop to get a port that refuses connections.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(!wait_for_reachable("127.0.0.1", port, &quick_probe(2)));
    }

    #[test]
    fn test_unresolvable_host() {
        assert!(!wait_for_reachable(
            "no-such-host.invalid",
            445,
            &quick_probe(1)
        ));
    }
}
