//! Error types for toolchain provisioning.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while provisioning or invoking the toolchain.
#[derive(Debug, Error)]
pub enum ToolchainError {
    // === Download ===
    /// The archive server answered with a non-success status.
    #[error("Download of {url} failed: HTTP {status}")]
    Network { url: String, status: u16 },

    /// The request could not be sent or the body could not be read.
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The downloaded archive is unreadable.
    #[error("Failed to read archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    // === Installation ===
    /// Provisioning finished but the binary is missing or not executable.
    #[error("Toolchain binary is missing or not executable: {path}")]
    NotInstalled { path: PathBuf },

    // === Path & IO ===
    #[error("Path error: {0}")]
    Path(#[from] devbridge_core::PathError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // === Invocation ===
    #[error(transparent)]
    Process(#[from] devbridge_core::ProcessError),
}
