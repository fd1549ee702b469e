//! `devbridge server` handler: start, hold until Ctrl-C, stop.

use std::sync::Arc;

use devbridge_core::{LogSink, StreamKind};

use super::toolchain;
use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Echoes server output to the terminal, stderr lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn append(&self, source: &str, stream: StreamKind, line: &str) {
        match stream {
            StreamKind::Stdout => println!("[{source}] {line}"),
            StreamKind::Stderr => eprintln!("[{source}] {line}"),
        }
    }
}

pub async fn execute(ctx: &CliContext, port: Option<u16>) -> Result<(), CliError> {
    toolchain::ensure(ctx).await?;

    let mut config = ctx.automation_config();
    if let Some(port) = port {
        config.preferred_port = port;
    }
    let mut orchestrator = ctx.orchestrator(config).with_log_sink(Arc::new(ConsoleSink));

    let port = orchestrator.start_server().await?;
    println!("Automation server ready on http://127.0.0.1:{port} (Ctrl-C to stop)");

    let exited = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal
                .map(|()| None)
                .map_err(|e| CliError::Process(format!("cannot listen for Ctrl-C: {e}")))
        }
        status = orchestrator.wait_for_server_exit() => Ok(status),
    };
    orchestrator.stop_server().await;

    match exited? {
        Some(status) => Err(CliError::Automation(format!(
            "automation server on port {port} exited unexpectedly ({status:?})"
        ))),
        None => {
            println!("Server stopped.");
            Ok(())
        }
    }
}
