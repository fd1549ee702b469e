//! Port negotiation for the automation server.

use std::net::TcpListener;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, warn};

use super::error::AutomationError;

const CONNECT_PROBE_TIMEOUT: Duration = Duration::from_millis(250);

/// Bounds for [`negotiate_port`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPolicy {
    pub scan_span: u16,
    pub wait: Duration,
    pub poll_interval: Duration,
}

/// Check if a port is available by binding and immediately releasing it.
pub fn is_port_available(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok_and(|listener| listener.local_addr().is_ok())
}

/// First bindable port in `preferred..preferred + span`, falling back to an
/// OS-assigned port.
pub fn find_available_port(preferred: u16, span: u16) -> Option<u16> {
    for offset in 0..span.max(1) {
        let Some(port) = preferred.checked_add(offset) else {
            break;
        };
        if is_port_available(port) {
            return Some(port);
        }
        debug!(port = %port, "port unavailable on system, skipping");
    }

    TcpListener::bind(("127.0.0.1", 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .ok()
}

/// Whether something is accepting connections on `port`.
pub async fn port_in_use(port: u16) -> bool {
    matches!(
        timeout(CONNECT_PROBE_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await,
        Ok(Ok(_))
    )
}

/// Pick a free port starting at `preferred`, then wait for it to stay free.
///
/// The port is shared system-wide, so the choice is re-checked until
/// `policy.wait` elapses.
pub async fn negotiate_port(preferred: u16, policy: PortPolicy) -> Result<u16, AutomationError> {
    let port = find_available_port(preferred, policy.scan_span).ok_or(
        AutomationError::PortUnavailable {
            port: preferred,
            waited: Duration::ZERO,
        },
    )?;

    let started = Instant::now();
    while port_in_use(port).await {
        let waited = started.elapsed();
        if waited >= policy.wait {
            return Err(AutomationError::PortUnavailable { port, waited });
        }
        warn!(port = %port, "port is in use, waiting");
        sleep(policy.poll_interval.min(policy.wait - waited)).await;
    }

    debug!(port = %port, preferred = %preferred, "negotiated port");
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PortPolicy {
        PortPolicy {
            scan_span: 100,
            wait: Duration::from_millis(300),
            poll_interval: Duration::from_millis(50),
        }
    }

    #[test]
    fn occupied_port_is_not_available() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(!is_port_available(port));
    }

    #[tokio::test]
    async fn negotiation_skips_occupied_preferred_port() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let occupied = listener.local_addr().unwrap().port();

        let port = negotiate_port(occupied, policy()).await.unwrap();
        assert_ne!(port, occupied);
    }

    #[tokio::test]
    async fn listening_port_is_in_use() {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(port_in_use(port).await);
        drop(listener);
        assert!(!port_in_use(port).await);
    }

    #[test]
    fn scan_near_the_top_of_the_range_falls_back() {
        assert!(find_available_port(u16::MAX, 100).is_some());
    }
}
