//! Bounded retry loop around the external remote-control client.

use std::time::Duration;

use devbridge_core::{RemoteControlClient, SessionTarget};
use tokio::time::sleep;
use tracing::{info, warn};

use super::error::AutomationError;

const CONNECTION_ERROR_MARKERS: [&str; 3] = ["connection error", "connection refused", "econnrefused"];

/// Whether `message` describes a transient connection failure.
pub fn is_connection_error(message: &str) -> bool {
    let message = message.to_lowercase();
    CONNECTION_ERROR_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Connect through `client`, retrying connection-class failures.
///
/// Other failures are returned immediately. After `attempts` connection
/// failures the last one is returned.
pub async fn connect_with_retry<C>(
    client: &C,
    target: &SessionTarget,
    attempts: u32,
    delay: Duration,
) -> Result<C::Session, AutomationError>
where
    C: RemoteControlClient + ?Sized,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let err = match client.connect(target).await {
            Ok(session) => {
                info!(host = %target.host, port = %target.port, attempt, "remote session established");
                return Ok(session);
            }
            Err(err) => err,
        };

        if !is_connection_error(&err.message) {
            return Err(AutomationError::Session {
                host: target.host.clone(),
                port: target.port,
                message: err.message,
            });
        }
        if attempt >= attempts {
            return Err(AutomationError::Connection {
                host: target.host.clone(),
                port: target.port,
                attempts: attempt,
                message: err.message,
            });
        }

        warn!(attempt, retry_in = ?delay, error = %err.message, "connection attempt failed, retrying");
        sleep(delay).await;
    }
}
