//! `devbridge app` handlers.

use std::sync::Arc;
use std::time::Duration;

use super::server::ConsoleSink;
use super::toolchain;
use crate::bootstrap::CliContext;
use crate::commands::AppCommand;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, command: AppCommand) -> Result<(), CliError> {
    toolchain::ensure(ctx).await?;
    let serial = ctx.serial.as_deref();

    match command {
        AppCommand::Open { package } => {
            ctx.orchestrator(ctx.automation_config())
                .open_app(&package, serial)
                .await?;
            println!("Opened {package}");
        }
        AppCommand::Close { package } => {
            ctx.orchestrator(ctx.automation_config())
                .close_app(&package, serial)
                .await?;
            println!("Closed {package}");
        }
        AppCommand::Session { package, hold_secs } => {
            let mut config = ctx.automation_config();
            if let Some(secs) = hold_secs {
                config.app_settle_delay = Duration::from_secs(secs);
            }
            let mut orchestrator = ctx.orchestrator(config).with_log_sink(Arc::new(ConsoleSink));
            orchestrator.run_app_session(&package, serial, None).await?;
            println!("Session for {package} finished.");
        }
    }
    Ok(())
}
