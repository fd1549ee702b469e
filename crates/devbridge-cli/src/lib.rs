//! Command-line adapter for devbridge: toolchain provisioning, device
//! listing, command pass-through, and automation server control.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs only.
use anyhow as _;
use dotenvy as _;
use tracing as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, bootstrap};
pub use commands::{AppCommand, Commands, ToolchainCommand};
pub use error::CliError;
pub use parser::Cli;
