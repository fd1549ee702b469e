//! Core domain types.
//!
//! These types describe processes, toolchains, devices and automation
//! servers independent of how they are spawned or fetched.
//!
//! # Structure
//!
//! - `process` - Supervised process records and buffered output
//! - `toolchain` - Platform variants, installations and env overlays
//! - `device` - Device kinds and listings
//! - `automation` - Automation server readiness and snapshots

mod automation;
mod device;
mod process;
mod toolchain;

pub use automation::{AutomationServerInstance, ServerReadiness};
pub use device::{DeviceKind, DeviceList, DeviceRecord, UNKNOWN_DEVICE_STATUS, device_list_from};
pub use process::{ProcessOutput, ProcessRecord, ProcessStatus};
pub use toolchain::{
    EnvOverlay, PLATFORM_TOOLS_DIR, PlatformVariant, ToolInstallation, is_executable,
};
