//! Device-bridge toolchain provisioning.
//!
//! Resolves an install directory, fetches the platform archive, unpacks it,
//! and builds the environment overlay other processes need to find the tools.

mod download;
mod error;
mod provisioner;

pub use download::{ProgressCallback, archive_url, extract_archive, fetch_archive};
pub use error::ToolchainError;
pub use provisioner::ToolchainProvisioner;
