//! Subcommand definitions.

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the device-bridge toolchain
    Toolchain {
        #[command(subcommand)]
        command: ToolchainCommand,
    },

    /// List attached devices
    Devices {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run adb with the given arguments (stderr is printed on failure)
    Adb {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        args: Vec<String>,
    },

    /// Run an arbitrary command to completion
    Run {
        /// Fail with the command's stderr on a non-zero exit
        #[arg(long)]
        checked: bool,

        command: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Start the automation server and keep it running until Ctrl-C
    Server {
        /// Preferred port (the next free port is used if taken)
        #[arg(long, env = "DEVBRIDGE_PREFERRED_PORT")]
        port: Option<u16>,
    },

    /// Wait until the device reports boot completion
    WaitDevice {
        /// Seconds to wait before giving up
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Open and close apps
    App {
        #[command(subcommand)]
        command: AppCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ToolchainCommand {
    /// Download and unpack the toolchain
    Install {
        /// Re-download even if already installed
        #[arg(long)]
        force: bool,
    },

    /// Print the environment overlay as shell exports
    Env,

    /// Print the adb binary path and whether it is installed
    Path,
}

#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// Launch an app by package name
    Open { package: String },

    /// Force-stop an app by package name
    Close { package: String },

    /// Start the server, open the app, hold, close it, and stop the server
    Session {
        package: String,

        /// Seconds to keep the app open
        #[arg(long)]
        hold_secs: Option<u64>,
    },
}
