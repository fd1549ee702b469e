//! Default toolchain install location.

use std::env;
use std::path::PathBuf;

use super::error::PathError;
use super::platform::resolve_config_dir;
use crate::domain::PlatformVariant;

/// Environment variable overriding the toolchain install directory.
pub const TOOLCHAIN_DIR_ENV: &str = "DEVBRIDGE_TOOLCHAIN_DIR";

/// Get the directory the device-bridge toolchain is installed into.
///
/// Resolution order:
/// 1. `DEVBRIDGE_TOOLCHAIN_DIR` environment variable
/// 2. `<config dir>/devbridge/android-sdk`
pub fn default_toolchain_dir() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(TOOLCHAIN_DIR_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let config = resolve_config_dir().ok_or_else(|| PathError::NoConfigDir {
        platform: PlatformVariant::current().to_string(),
    })?;
    Ok(config.join("devbridge").join("android-sdk"))
}
