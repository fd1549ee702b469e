//! CLI-specific error types and exit codes.

use devbridge_core::{PathError, ProcessError, SettingsError};
use devbridge_runtime::{AutomationError, ToolchainError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Toolchain download or installation failure.
    #[error("Toolchain error: {0}")]
    Toolchain(String),

    /// Spawn failure or a failed checked command.
    #[error("Process error: {0}")]
    Process(String),

    /// Automation server, device, or session failure.
    #[error("Automation error: {0}")]
    Automation(String),

    /// Timed out waiting for a server or device.
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl CliError {
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78,     // EX_CONFIG
            Self::Toolchain(_) => 69,  // EX_UNAVAILABLE
            Self::Process(_) => 71,    // EX_OSERR
            Self::Automation(_) => 1,
            Self::Timeout(_) => 75,    // EX_TEMPFAIL
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<ProcessError> for CliError {
    fn from(err: ProcessError) -> Self {
        Self::Process(err.to_string())
    }
}

impl From<ToolchainError> for CliError {
    fn from(err: ToolchainError) -> Self {
        match err {
            ToolchainError::Process(e) => e.into(),
            ToolchainError::Path(e) => e.into(),
            other => Self::Toolchain(other.to_string()),
        }
    }
}

impl From<AutomationError> for CliError {
    fn from(err: AutomationError) -> Self {
        match err {
            AutomationError::StartupTimeout { .. }
            | AutomationError::DeviceNotReady { .. }
            | AutomationError::PortUnavailable { .. } => Self::Timeout(err.to_string()),
            AutomationError::Toolchain(e) => e.into(),
            AutomationError::Process(e) => e.into(),
            other => Self::Automation(other.to_string()),
        }
    }
}
