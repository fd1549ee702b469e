//! Command handlers.
//!
//! Each handler takes the [`CliContext`](crate::bootstrap::CliContext),
//! calls into `devbridge-runtime`, and formats the result for the terminal.

pub mod adb;
pub mod app;
pub mod devices;
pub mod run;
pub mod server;
pub mod toolchain;
pub mod wait_device;
