//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core expects from infrastructure
//! and from external collaborators it does not implement itself.
//!
//! # Design Rules
//!
//! - No tokio or reqwest types in any signature
//! - Intent-based methods (what the caller wants, not how it is done)

pub mod log_sink;
pub mod remote_session;

use thiserror::Error;

pub use log_sink::{LogSink, NoopLogSink, StreamKind};
pub use remote_session::{RemoteControlClient, RemoteSessionError, SessionTarget};

/// Errors raised by the process supervision layer.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// An empty command string was supplied; nothing was spawned.
    #[error("Refusing to spawn an empty command")]
    EmptyCommand,

    /// The binary could not be found or executed.
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A one-shot command exited with a non-zero code.
    #[error("'{command}' exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// The supervisor already owns a live process.
    #[error("'{command}' is already running (pid {pid:?})")]
    AlreadyRunning { command: String, pid: Option<u32> },

    /// `start` was called on a supervisor with no registered command.
    #[error("No command has been registered")]
    NoCommand,

    /// No supervisor is registered under the key.
    #[error("No process registered under '{0}'")]
    UnknownKey(String),

    /// A supervisor is already registered under the key.
    #[error("A process is already registered under '{0}'")]
    DuplicateKey(String),

    /// Waiting on or signalling the process failed.
    #[error("Process I/O error: {0}")]
    Io(#[from] std::io::Error),
}
