//! `devbridge devices` handler.

use devbridge_core::DeviceKind;

use super::toolchain;
use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, json: bool) -> Result<(), CliError> {
    toolchain::ensure(ctx).await?;
    let devices = ctx
        .hub
        .list_devices(DeviceKind::Android, &ctx.invoke_options())
        .await?;

    if json {
        let text = serde_json::to_string_pretty(&devices)
            .map_err(|e| CliError::Process(format!("cannot encode device list: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices attached.");
        return Ok(());
    }
    let width = devices.keys().map(String::len).max().unwrap_or(0);
    for (serial, status) in &devices {
        println!("{serial:<width$}  {status}");
    }
    Ok(())
}
