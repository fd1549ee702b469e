//! Single-process supervisor.
//!
//! A [`ProcessSupervisor`] owns at most one live child at a time together
//! with the [`ProcessRecord`] describing it. Every mutation of the record
//! happens through the supervisor's own methods.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use chrono::Utc;
use devbridge_core::{ProcessError, ProcessOutput, ProcessRecord, ProcessStatus};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use super::shutdown::shutdown_child;

/// Default grace period between SIGTERM and SIGKILL.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(1);

/// Live output streams of a started process.
///
/// The streams stay readable until the process exits; `stop` closes them
/// by terminating the process.
#[derive(Debug)]
pub struct StreamHandles {
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// Spawns, tracks and terminates one external command.
#[derive(Debug)]
pub struct ProcessSupervisor {
    record: ProcessRecord,
    child: Option<Child>,
    env: Vec<(String, String)>,
    stop_grace: Duration,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self {
            record: ProcessRecord::default(),
            child: None,
            env: Vec::new(),
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    /// Add environment variables applied to every spawned process.
    ///
    /// The supervisor's own process environment is never modified.
    #[must_use]
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    #[must_use]
    pub const fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Snapshot of the current record.
    pub fn info(&self) -> ProcessRecord {
        self.record.clone()
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Register a command without spawning it.
    pub fn add<I, S>(&mut self, command: &str, args: I) -> Result<(), ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let command = validate_command(command)?;
        self.ensure_idle()?;
        let args = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        self.record = ProcessRecord::new(command, args);
        Ok(())
    }

    /// Spawn `command`, buffer both streams and wait for it to exit.
    pub async fn run_to_completion<I, S>(
        &mut self,
        command: &str,
        args: I,
    ) -> Result<ProcessOutput, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add(command, args)?;
        self.run_registered().await
    }

    /// Like [`run_to_completion`](Self::run_to_completion) but a non-zero
    /// exit is an error carrying the stderr text.
    pub async fn run_checked<I, S>(
        &mut self,
        command: &str,
        args: I,
    ) -> Result<ProcessOutput, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let output = self.run_to_completion(command, args).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(ProcessError::CommandFailed {
                command: self.record.command_line(),
                code: output.exit_code,
                stderr: output.stderr_text().trim().to_string(),
            })
        }
    }

    /// Run the registered command to completion.
    pub async fn run_registered(&mut self) -> Result<ProcessOutput, ProcessError> {
        self.ensure_idle()?;
        let mut cmd = self.build_command()?;
        cmd.stdin(Stdio::null());

        self.record.time_added.get_or_insert_with(Utc::now);
        self.record.time_stopped = None;
        let child = self.spawn(&mut cmd)?;
        debug!(command = %self.record.command_line(), pid = ?self.record.pid, "running to completion");

        let result = child.wait_with_output().await;
        self.record.time_stopped = Some(Utc::now());
        let output = result?;

        let exit_code = output.status.code().unwrap_or(-1);
        self.record.status = status_from_exit(output.status);
        Ok(ProcessOutput {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Spawn `command` as a long-running process and hand back its streams.
    pub fn start<I, S>(&mut self, command: &str, args: I) -> Result<StreamHandles, ProcessError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add(command, args)?;
        self.start_registered()
    }

    /// Spawn the registered command as a long-running process.
    pub fn start_registered(&mut self) -> Result<StreamHandles, ProcessError> {
        self.ensure_idle()?;
        let mut cmd = self.build_command()?;
        cmd.stdin(Stdio::null());

        self.record.time_added.get_or_insert_with(Utc::now);
        self.record.time_stopped = None;
        let mut child = self.spawn(&mut cmd)?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            self.child = Some(child);
            return Err(ProcessError::Io(std::io::Error::other(
                "child output pipes were not captured",
            )));
        };

        info!(command = %self.record.command_line(), pid = ?self.record.pid, "process started");
        self.child = Some(child);
        Ok(StreamHandles { stdout, stderr })
    }

    /// Terminate the live process.
    ///
    /// Returns `false` when there is no process handle. Calling it again
    /// after a successful stop is a no-op returning `false`.
    pub async fn stop(&mut self) -> bool {
        let Some(mut child) = self.child.take() else {
            return false;
        };

        if let Ok(Some(status)) = child.try_wait() {
            self.record_exit(status);
            return true;
        }

        match shutdown_child(&mut child, self.stop_grace).await {
            Ok(status) => debug!(pid = ?self.record.pid, ?status, "process stopped"),
            Err(e) => warn!(pid = ?self.record.pid, error = %e, "error while stopping process"),
        }
        self.record.status = ProcessStatus::Killed;
        self.record.time_stopped = Some(Utc::now());
        true
    }

    /// Poll the child without blocking and return the updated status.
    pub fn refresh(&mut self) -> ProcessStatus {
        let exited = match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(status) => status,
                Err(e) => {
                    debug!(error = %e, "try_wait failed");
                    None
                }
            },
            None => None,
        };
        if let Some(status) = exited {
            self.child = None;
            self.record_exit(status);
        }
        self.record.status
    }

    pub fn is_running(&mut self) -> bool {
        self.refresh().is_running()
    }

    /// Wait for the live process to exit on its own.
    pub async fn wait(&mut self) -> Result<ProcessStatus, ProcessError> {
        if let Some(child) = self.child.as_mut() {
            let status = child.wait().await?;
            self.child = None;
            self.record_exit(status);
        }
        Ok(self.record.status)
    }

    fn ensure_idle(&mut self) -> Result<(), ProcessError> {
        if self.is_running() {
            return Err(ProcessError::AlreadyRunning {
                command: self.record.command_line(),
                pid: self.record.pid,
            });
        }
        Ok(())
    }

    fn build_command(&self) -> Result<Command, ProcessError> {
        if self.record.command.is_empty() {
            return Err(ProcessError::NoCommand);
        }
        let mut cmd = Command::new(&self.record.command);
        cmd.args(&self.record.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(cmd)
    }

    fn spawn(&mut self, cmd: &mut Command) -> Result<Child, ProcessError> {
        let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: self.record.command.clone(),
            source,
        })?;
        self.record.pid = child.id();
        self.record.time_started = Some(Utc::now());
        self.record.status = ProcessStatus::Running;
        Ok(child)
    }

    fn record_exit(&mut self, status: ExitStatus) {
        self.record.status = status_from_exit(status);
        self.record.time_stopped.get_or_insert_with(Utc::now);
        debug!(pid = ?self.record.pid, status = ?self.record.status, "process exited");
    }
}

fn validate_command(command: &str) -> Result<&str, ProcessError> {
    let command = command.trim();
    if command.is_empty() {
        Err(ProcessError::EmptyCommand)
    } else {
        Ok(command)
    }
}

fn status_from_exit(status: ExitStatus) -> ProcessStatus {
    status
        .code()
        .map_or(ProcessStatus::Killed, ProcessStatus::Exited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn add_rejects_empty_command() {
        let mut supervisor = ProcessSupervisor::new();
        let err = supervisor.add("  ", ["x"]).unwrap_err();
        assert!(matches!(err, ProcessError::EmptyCommand));
        assert_eq!(supervisor.info(), ProcessRecord::default());
    }

    #[test]
    fn add_leaves_timestamps_unset() {
        let mut supervisor = ProcessSupervisor::new();
        supervisor.add("echo", ["hi"]).unwrap();
        let record = supervisor.info();
        assert_eq!(record.command, "echo");
        assert_eq!(record.args, vec!["hi".to_string()]);
        assert_eq!(record.status, ProcessStatus::Created);
        assert!(record.time_added.is_none());
        assert!(record.time_started.is_none());
        assert!(record.pid.is_none());
    }

    #[test]
    fn start_rejects_empty_command() {
        let mut supervisor = ProcessSupervisor::new();
        let err = supervisor.start("", Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ProcessError::EmptyCommand));
        assert!(supervisor.pid().is_none());
    }

    #[test]
    fn start_registered_without_command() {
        let mut supervisor = ProcessSupervisor::new();
        assert!(matches!(
            supervisor.start_registered(),
            Err(ProcessError::NoCommand)
        ));
    }

    #[tokio::test]
    async fn stop_without_process_returns_false() {
        let mut supervisor = ProcessSupervisor::new();
        assert!(!supervisor.stop().await);
        assert!(!supervisor.stop().await);
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let mut supervisor = ProcessSupervisor::new();
        let err = supervisor
            .run_to_completion("definitely-not-a-real-binary-4f2a", Vec::<String>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn run_to_completion_records_timestamps() {
        let mut supervisor = ProcessSupervisor::new();
        let output = supervisor.run_to_completion("echo", ["hello"]).await.unwrap();

        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout_text().trim(), "hello");

        let record = supervisor.info();
        assert_eq!(record.status, ProcessStatus::Exited(0));
        let started = record.time_started.unwrap();
        let stopped = record.time_stopped.unwrap();
        assert!(record.time_added.unwrap() <= started);
        assert!(started <= stopped);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn run_with_empty_args_is_valid() {
        let mut supervisor = ProcessSupervisor::new();
        let output = supervisor
            .run_to_completion("true", Vec::<String>::new())
            .await
            .unwrap();
        assert!(output.success());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn run_checked_raises_on_non_zero() {
        let mut supervisor = ProcessSupervisor::new();
        let err = supervisor
            .run_checked("sh", ["-c", "echo broken >&2; exit 3"])
            .await
            .unwrap_err();
        match err {
            ProcessError::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn env_overlay_reaches_child() {
        let mut supervisor = ProcessSupervisor::new().with_env([("DEVBRIDGE_PROBE", "visible")]);
        let output = supervisor
            .run_to_completion("sh", ["-c", "printf %s \"$DEVBRIDGE_PROBE\""])
            .await
            .unwrap();
        assert_eq!(output.stdout_text(), "visible");
        assert!(std::env::var("DEVBRIDGE_PROBE").is_err());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn start_then_stop_is_idempotent() {
        let mut supervisor = ProcessSupervisor::new().with_stop_grace(Duration::from_millis(500));
        let _streams = supervisor.start("sleep", ["30"]).unwrap();
        assert!(supervisor.is_running());
        assert!(supervisor.info().time_stopped.is_none());

        assert!(supervisor.stop().await);
        let record = supervisor.info();
        assert_eq!(record.status, ProcessStatus::Killed);
        assert!(record.time_stopped.is_some());

        assert!(!supervisor.stop().await);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn second_start_while_running_is_rejected() {
        let mut supervisor = ProcessSupervisor::new();
        let _streams = supervisor.start("sleep", ["30"]).unwrap();
        let err = supervisor.start("sleep", ["30"]).unwrap_err();
        assert!(matches!(err, ProcessError::AlreadyRunning { .. }));
        supervisor.stop().await;
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn streams_close_when_process_exits() {
        let mut supervisor = ProcessSupervisor::new();
        let mut streams = supervisor.start("echo", ["streamed"]).unwrap();
        let mut text = String::new();
        streams.stdout.read_to_string(&mut text).await.unwrap();
        assert_eq!(text.trim(), "streamed");

        assert_eq!(supervisor.wait().await.unwrap(), ProcessStatus::Exited(0));
        assert!(!supervisor.is_running());
    }
}
