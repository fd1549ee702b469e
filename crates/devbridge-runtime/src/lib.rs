//! Runtime adapters for devbridge.
//!
//! # Structure
//!
//! - `process` - Supervisor, keyed registry, drain tasks, graceful shutdown
//! - `toolchain` - Archive download and extraction, env overlay
//! - `devices` - Device bridges (Android via `adb`)
//! - `automation` - Automation server orchestration and session retries
//!
//! Data flows downward only: automation → devices/toolchain → process → OS.

pub mod automation;
pub mod devices;
pub mod process;
pub mod toolchain;

pub use automation::{AppScript, AutomationConfig, AutomationError, AutomationOrchestrator};
pub use devices::{AndroidBridge, DeviceBridge, DeviceHub, InvokeOptions};
pub use process::{ProcessRegistry, ProcessSupervisor, StreamHandles};
pub use toolchain::{ToolchainError, ToolchainProvisioner};
