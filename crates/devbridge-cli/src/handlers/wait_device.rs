//! `devbridge wait-device` handler.

use std::time::Duration;

use super::toolchain;
use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, timeout_secs: Option<u64>) -> Result<(), CliError> {
    toolchain::ensure(ctx).await?;

    let mut config = ctx.automation_config();
    if let Some(secs) = timeout_secs {
        config.device_timeout = Duration::from_secs(secs);
    }
    ctx.orchestrator(config)
        .wait_for_device_ready(ctx.serial.as_deref())
        .await?;
    println!("Device ready.");
    Ok(())
}
