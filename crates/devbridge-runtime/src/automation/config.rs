//! Orchestrator bounds and timings.

use std::path::PathBuf;
use std::time::Duration;

use devbridge_core::BridgeSettings;
use devbridge_core::settings::{
    DEFAULT_CONNECT_ATTEMPTS, DEFAULT_DEVICE_TIMEOUT_SECS, DEFAULT_PORT_WAIT_SECS,
    DEFAULT_PREFERRED_PORT, DEFAULT_SERVER_BINARY, DEFAULT_STARTUP_TIMEOUT_SECS,
};

/// Every timeout and retry bound used by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationConfig {
    /// Automation server binary, resolved through `PATH`.
    pub server_binary: String,
    /// Toolchain install dir; the provisioner's default when `None`.
    pub install_dir: Option<PathBuf>,

    pub preferred_port: u16,
    /// How many ports above the preferred one are probed.
    pub port_scan_span: u16,
    /// Ceiling for a chosen port to stop being externally in use.
    pub port_wait: Duration,
    pub port_poll_interval: Duration,

    /// Ceiling for the readiness marker to appear.
    pub startup_timeout: Duration,
    pub readiness_poll_interval: Duration,
    /// SIGTERM to SIGKILL grace period.
    pub stop_grace: Duration,

    pub device_timeout: Duration,
    pub device_poll_interval: Duration,
    /// Send the menu key once the device has booted.
    pub keep_alive: bool,

    pub connect_attempts: u32,
    pub connect_retry_delay: Duration,

    /// Pause after opening an app when no script runs.
    pub app_settle_delay: Duration,
    /// Pause after closing an app before the server stops.
    pub app_close_delay: Duration,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            server_binary: DEFAULT_SERVER_BINARY.to_string(),
            install_dir: None,
            preferred_port: DEFAULT_PREFERRED_PORT,
            port_scan_span: 100,
            port_wait: Duration::from_secs(DEFAULT_PORT_WAIT_SECS),
            port_poll_interval: Duration::from_secs(1),
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            readiness_poll_interval: Duration::from_millis(500),
            stop_grace: Duration::from_secs(1),
            device_timeout: Duration::from_secs(DEFAULT_DEVICE_TIMEOUT_SECS),
            device_poll_interval: Duration::from_secs(1),
            keep_alive: true,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_retry_delay: Duration::from_secs(2),
            app_settle_delay: Duration::from_secs(3),
            app_close_delay: Duration::from_secs(1),
        }
    }
}

impl AutomationConfig {
    pub fn from_settings(settings: &BridgeSettings) -> Self {
        Self {
            server_binary: settings.effective_server_binary().to_string(),
            install_dir: settings.toolchain_dir.clone(),
            preferred_port: settings.effective_preferred_port(),
            port_wait: Duration::from_secs(settings.effective_port_wait_secs()),
            startup_timeout: Duration::from_secs(settings.effective_startup_timeout_secs()),
            device_timeout: Duration::from_secs(settings.effective_device_timeout_secs()),
            connect_attempts: settings.effective_connect_attempts(),
            ..Self::default()
        }
    }
}
