//! `devbridge adb` handler: a pass-through to the bridge binary.

use super::toolchain;
use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, args: &[String]) -> Result<(), CliError> {
    toolchain::ensure(ctx).await?;
    let output = ctx.hub.android().invoke(&ctx.invoke_options(), args).await?;
    print!("{output}");
    if !output.is_empty() && !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
