//! `devbridge run` handler.

use std::io::Write;

use devbridge_runtime::ProcessSupervisor;

use crate::error::CliError;

/// Run `command` to completion and echo its output. Returns the exit code
/// the CLI should exit with.
pub async fn execute(checked: bool, command: &str, args: &[String]) -> Result<i32, CliError> {
    let mut supervisor = ProcessSupervisor::new();
    let output = if checked {
        supervisor.run_checked(command, args).await?
    } else {
        supervisor.run_to_completion(command, args).await?
    };

    std::io::stdout()
        .write_all(&output.stdout)
        .and_then(|()| std::io::stderr().write_all(&output.stderr))
        .map_err(|e| CliError::Process(e.to_string()))?;
    Ok(output.exit_code)
}
