//! `devbridge toolchain` handlers.

use devbridge_core::ToolInstallation;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

use crate::bootstrap::CliContext;
use crate::commands::ToolchainCommand;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, command: ToolchainCommand) -> Result<(), CliError> {
    match command {
        ToolchainCommand::Install { force } => {
            let installation = install(ctx, force).await?;
            println!("adb: {}", installation.binary_path.display());
        }
        ToolchainCommand::Env => {
            let dir = ctx.toolchain_dir();
            let overlay = ctx.provisioner().setup_environment(dir.as_deref(), None).await?;
            for (key, value) in overlay.vars() {
                println!("export {key}=\"{value}\"");
            }
        }
        ToolchainCommand::Path => {
            let dir = ctx.toolchain_dir();
            let installation = ctx.provisioner().installation(dir.as_deref())?;
            let state = if installation.is_ready() {
                "installed"
            } else {
                "not installed"
            };
            println!("{} ({state})", installation.binary_path.display());
        }
    }
    Ok(())
}

/// Provision the toolchain, drawing a progress bar while the archive downloads.
pub async fn install(ctx: &CliContext, force: bool) -> Result<ToolInstallation, CliError> {
    let dir = ctx.toolchain_dir();
    let provisioner = ctx.provisioner();
    if provisioner.is_installed(dir.as_deref()) && !force {
        return Ok(provisioner.installation(dir.as_deref())?);
    }

    println!("Downloading {}", provisioner.archive_url());
    let bar = spinner();
    let report = |downloaded: u64, total: u64| {
        if total > 0 && bar.length() != Some(total) {
            bar.set_length(total);
            if let Some(style) = download_style() {
                bar.set_style(style);
            }
        }
        bar.set_position(downloaded);
        bar.set_message(HumanBytes(downloaded).to_string());
    };
    let progress: &(dyn Fn(u64, u64) + Send + Sync) = &report;

    let result = provisioner
        .ensure_installed_with_progress(dir.as_deref(), force, Some(progress))
        .await;
    match &result {
        Ok(_) => bar.finish_with_message("unpacked"),
        Err(_) => bar.abandon_with_message("failed"),
    }
    Ok(result?)
}

/// Provision on first use so device commands work out of the box.
pub async fn ensure(ctx: &CliContext) -> Result<(), CliError> {
    if !ctx.provisioner().is_installed(ctx.toolchain_dir().as_deref()) {
        install(ctx, false).await?;
    }
    Ok(())
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        bar.set_style(style);
    }
    bar
}

fn download_style() -> Option<ProgressStyle> {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
    )
    .ok()
    .map(|style| style.progress_chars("█▓░"))
}
