//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for provisioning device tooling and driving the
/// automation server.
#[derive(Parser, Debug)]
#[command(name = "devbridge")]
#[command(about = "Provision device tooling and orchestrate automation servers")]
#[command(version)]
pub struct Cli {
    /// Override the toolchain install directory for this invocation
    #[arg(long = "toolchain-dir", global = true, env = "DEVBRIDGE_TOOLCHAIN_DIR")]
    pub toolchain_dir: Option<PathBuf>,

    /// Target device serial (passed to adb as `-s <serial>`)
    #[arg(short = 's', long = "serial", global = true)]
    pub serial: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
