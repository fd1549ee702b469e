//! Core domain types, ports and path resolution for devbridge.
//!
//! This crate holds everything that does not spawn processes or touch the
//! network: process records, toolchain layouts, device listings, the
//! remote-session and log-sink ports, settings, and config-dir lookup.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AutomationServerInstance, DeviceKind, DeviceList, DeviceRecord, EnvOverlay, PlatformVariant,
    ProcessOutput, ProcessRecord, ProcessStatus, ServerReadiness, ToolInstallation, is_executable,
};
pub use paths::{PathError, default_toolchain_dir, resolve_config_dir};
pub use ports::{
    LogSink, NoopLogSink, ProcessError, RemoteControlClient, RemoteSessionError, SessionTarget,
    StreamKind,
};
pub use settings::{BridgeSettings, SettingsError, validate_settings};
