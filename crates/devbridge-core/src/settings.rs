//! Bridge settings and validation.
//!
//! Settings are read from `DEVBRIDGE_*` environment variables (adapters load
//! a `.env` file first). Every field is optional; `effective_*` accessors
//! apply the defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default archive base URL; the OS name and `.zip` are appended.
pub const DEFAULT_TOOLCHAIN_BASE_URL: &str =
    "https://dl.google.com/android/repository/platform-tools-latest-";

/// Default automation server binary, resolved through `PATH`.
pub const DEFAULT_SERVER_BINARY: &str = "appium";

/// Default preferred automation server port.
pub const DEFAULT_PREFERRED_PORT: u16 = 4723;

/// Default ceiling for waiting on a contended port (seconds).
pub const DEFAULT_PORT_WAIT_SECS: u64 = 30;

/// Default ceiling for the readiness marker to appear (seconds).
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 60;

/// Default ceiling for a device to report boot completion (seconds).
pub const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = 60;

/// Default number of remote-session connection attempts.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;

/// Bridge settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BridgeSettings {
    /// Toolchain install directory (defaults to the platform config dir).
    pub toolchain_dir: Option<PathBuf>,

    /// Archive base URL (the OS name and `.zip` are appended).
    pub toolchain_base_url: Option<String>,

    /// Automation server binary.
    pub server_binary: Option<String>,

    /// Preferred automation server port.
    pub preferred_port: Option<u16>,

    /// Ceiling for waiting on a contended port.
    pub port_wait_secs: Option<u64>,

    /// Ceiling for the readiness marker to appear.
    pub startup_timeout_secs: Option<u64>,

    /// Ceiling for device boot completion.
    pub device_timeout_secs: Option<u64>,

    /// Remote-session connection attempts.
    pub connect_attempts: Option<u32>,
}

impl BridgeSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary env accessor.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let settings = Self {
            toolchain_dir: get("DEVBRIDGE_TOOLCHAIN_DIR").map(PathBuf::from),
            toolchain_base_url: get("DEVBRIDGE_TOOLCHAIN_URL"),
            server_binary: get("DEVBRIDGE_SERVER_BINARY"),
            preferred_port: parse_var(&get, "DEVBRIDGE_PREFERRED_PORT")?,
            port_wait_secs: parse_var(&get, "DEVBRIDGE_PORT_WAIT_SECS")?,
            startup_timeout_secs: parse_var(&get, "DEVBRIDGE_STARTUP_TIMEOUT_SECS")?,
            device_timeout_secs: parse_var(&get, "DEVBRIDGE_DEVICE_TIMEOUT_SECS")?,
            connect_attempts: parse_var(&get, "DEVBRIDGE_CONNECT_ATTEMPTS")?,
        };
        validate_settings(&settings)?;
        Ok(settings)
    }

    pub fn effective_toolchain_base_url(&self) -> &str {
        self.toolchain_base_url
            .as_deref()
            .unwrap_or(DEFAULT_TOOLCHAIN_BASE_URL)
    }

    pub fn effective_server_binary(&self) -> &str {
        self.server_binary.as_deref().unwrap_or(DEFAULT_SERVER_BINARY)
    }

    #[must_use]
    pub const fn effective_preferred_port(&self) -> u16 {
        match self.preferred_port {
            Some(port) => port,
            None => DEFAULT_PREFERRED_PORT,
        }
    }

    #[must_use]
    pub const fn effective_port_wait_secs(&self) -> u64 {
        match self.port_wait_secs {
            Some(secs) => secs,
            None => DEFAULT_PORT_WAIT_SECS,
        }
    }

    #[must_use]
    pub const fn effective_startup_timeout_secs(&self) -> u64 {
        match self.startup_timeout_secs {
            Some(secs) => secs,
            None => DEFAULT_STARTUP_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub const fn effective_device_timeout_secs(&self) -> u64 {
        match self.device_timeout_secs {
            Some(secs) => secs,
            None => DEFAULT_DEVICE_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub const fn effective_connect_attempts(&self) -> u32 {
        match self.connect_attempts {
            Some(attempts) => attempts,
            None => DEFAULT_CONNECT_ATTEMPTS,
        }
    }
}

fn parse_var<T, F>(get: &F, key: &'static str) -> Result<Option<T>, SettingsError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| SettingsError::InvalidValue {
                key,
                value: raw.clone(),
            })
        })
        .transpose()
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Port should be >= 1024 (privileged ports require root), got {0}")]
    InvalidPort(u16),

    #[error("Connection attempts must be at least 1")]
    NoConnectAttempts,

    #[error("Timeouts must be greater than zero ({0})")]
    ZeroTimeout(&'static str),
}

/// Validate settings values.
pub fn validate_settings(settings: &BridgeSettings) -> Result<(), SettingsError> {
    if let Some(port) = settings.preferred_port {
        if port < 1024 {
            return Err(SettingsError::InvalidPort(port));
        }
    }

    if settings.connect_attempts == Some(0) {
        return Err(SettingsError::NoConnectAttempts);
    }

    if settings.startup_timeout_secs == Some(0) {
        return Err(SettingsError::ZeroTimeout("startup_timeout_secs"));
    }

    if settings.device_timeout_secs == Some(0) {
        return Err(SettingsError::ZeroTimeout("device_timeout_secs"));
    }

    Ok(())
}
