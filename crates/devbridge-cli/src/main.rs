//! CLI entry point - the composition root.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use devbridge_cli::{Cli, CliError, Commands, bootstrap, handlers};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env before settings are read
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32, CliError> {
    let ctx = bootstrap(&cli)?;

    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command()
            .print_help()
            .map_err(|e| CliError::Process(e.to_string()))?;
        return Ok(0);
    };

    match command {
        Commands::Toolchain { command } => handlers::toolchain::execute(&ctx, command).await?,
        Commands::Devices { json } => handlers::devices::execute(&ctx, json).await?,
        Commands::Adb { args } => handlers::adb::execute(&ctx, &args).await?,
        Commands::Run {
            checked,
            command,
            args,
        } => return handlers::run::execute(checked, &command, &args).await,
        Commands::Server { port } => handlers::server::execute(&ctx, port).await?,
        Commands::WaitDevice { timeout_secs } => {
            handlers::wait_device::execute(&ctx, timeout_secs).await?;
        }
        Commands::App { command } => handlers::app::execute(&ctx, command).await?,
    }
    Ok(0)
}
