//! Composition root: settings plus command-line overrides become runtime services.

use std::path::PathBuf;

use devbridge_core::BridgeSettings;
use devbridge_runtime::{
    AutomationConfig, AutomationOrchestrator, DeviceHub, InvokeOptions, ToolchainProvisioner,
};

use crate::error::CliError;
use crate::parser::Cli;

/// Shared services for command handlers.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub settings: BridgeSettings,
    pub hub: DeviceHub,
    pub serial: Option<String>,
}

impl CliContext {
    pub fn provisioner(&self) -> &ToolchainProvisioner {
        self.hub.android().provisioner()
    }

    pub fn toolchain_dir(&self) -> Option<PathBuf> {
        self.settings.toolchain_dir.clone()
    }

    pub fn invoke_options(&self) -> InvokeOptions {
        InvokeOptions {
            install_dir: self.toolchain_dir(),
            serial: self.serial.clone(),
        }
    }

    pub fn automation_config(&self) -> AutomationConfig {
        AutomationConfig::from_settings(&self.settings)
    }

    pub fn orchestrator(&self, config: AutomationConfig) -> AutomationOrchestrator {
        AutomationOrchestrator::new(config, self.hub.clone())
    }
}

/// Build the context from environment settings and global flags.
pub fn bootstrap(cli: &Cli) -> Result<CliContext, CliError> {
    let settings = BridgeSettings::from_env()?;
    Ok(context_from(settings, cli))
}

fn context_from(mut settings: BridgeSettings, cli: &Cli) -> CliContext {
    if let Some(dir) = &cli.toolchain_dir {
        settings.toolchain_dir = Some(dir.clone());
    }
    let hub = DeviceHub::new(ToolchainProvisioner::from_settings(&settings));
    CliContext {
        settings,
        hub,
        serial: cli.serial.clone(),
    }
}
