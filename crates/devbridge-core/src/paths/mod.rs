//! Path utilities for devbridge config and toolchain locations.
//!
//! # Design
//!
//! - Returns `PathBuf`/`Option<PathBuf>` and `PathError` for clear error handling
//! - No interactive I/O - adapters decide how to ask for explicit paths
//! - OS-specific lookups are pure functions over an env accessor

mod ensure;
mod error;
mod platform;
mod toolchain;

#[cfg(test)]
pub(crate) mod test_utils;

pub use ensure::ensure_directory;
pub use error::PathError;
pub use platform::{config_dir_for, resolve_config_dir};
pub use toolchain::{TOOLCHAIN_DIR_ENV, default_toolchain_dir};
