//! Process bookkeeping types.
//!
//! A `ProcessRecord` is owned by exactly one supervisor and only mutated
//! through that supervisor. Everything handed to callers is a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a supervised process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "code", rename_all = "lowercase")]
pub enum ProcessStatus {
    /// Command registered but never spawned.
    #[default]
    Created,
    /// Spawned and not yet observed to exit.
    Running,
    /// Exited on its own with the given code.
    Exited(i32),
    /// Terminated by a signal (ours or someone else's).
    Killed,
}

impl ProcessStatus {
    /// Whether the process is currently live.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether the process has finished, by exit or by signal.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Exited(_) | Self::Killed)
    }
}

/// Snapshot of a supervised command and its timing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Program that was (or will be) executed.
    pub command: String,
    /// Arguments in invocation order.
    pub args: Vec<String>,
    /// OS process id while the process exists.
    pub pid: Option<u32>,
    /// Current lifecycle status.
    pub status: ProcessStatus,
    /// When the command was handed to the supervisor for execution.
    pub time_added: Option<DateTime<Utc>>,
    /// When the process was spawned.
    pub time_started: Option<DateTime<Utc>>,
    /// When the process was observed to exit or was stopped.
    pub time_stopped: Option<DateTime<Utc>>,
}

impl ProcessRecord {
    /// Create a record for a command that has not been spawned yet.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            ..Self::default()
        }
    }

    /// Render the command line for logs and error messages.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Fully buffered result of a run-to-completion invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Whether the process exited with code zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout decoded lossily as UTF-8.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily as UTF-8.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}
