use std::time::Duration;

use devbridge_core::{DeviceKind, ProcessError, ProcessStatus};
use thiserror::Error;

use crate::toolchain::ToolchainError;

/// Errors raised by the automation orchestrator.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// The chosen port stayed in use past the wait ceiling.
    #[error("Port {port} remained in use for {waited:?}")]
    PortUnavailable { port: u16, waited: Duration },

    /// The readiness marker did not appear in time.
    #[error("Automation server on port {port} failed to start within {timeout:?}")]
    StartupTimeout { port: u16, timeout: Duration },

    /// The server process exited before it reported readiness.
    #[error("Automation server on port {port} exited during startup ({status:?})")]
    ServerExited { port: u16, status: ProcessStatus },

    #[error("A server is already running on port {port}")]
    AlreadyRunning { port: u16 },

    #[error("Device {device} not ready after {timeout:?}")]
    DeviceNotReady { device: String, timeout: Duration },

    /// Connection-class failures persisted through every attempt.
    #[error("Could not connect to {host}:{port} after {attempts} attempt(s): {message}")]
    Connection {
        host: String,
        port: u16,
        attempts: u32,
        message: String,
    },

    /// The remote-control client failed for a non-connection reason.
    #[error("Session with {host}:{port} failed: {message}")]
    Session {
        host: String,
        port: u16,
        message: String,
    },

    #[error("Failed to {action} app '{package}': {output}")]
    AppControl {
        action: &'static str,
        package: String,
        output: String,
    },

    #[error("No {kind} devices found")]
    NoDevices { kind: DeviceKind },

    #[error("Script failed: {0}")]
    Script(String),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}
