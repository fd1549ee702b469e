//! Platform-specific config directory resolution.
//!
//! The lookup is split into a pure function over an environment accessor so
//! every platform variant can be tested from any host.

use std::env;
use std::path::PathBuf;

use crate::domain::PlatformVariant;

/// Resolve the config directory for `variant` using `lookup` for env vars.
///
/// - linux: `XDG_CONFIG_HOME`, else `$HOME/.config`
/// - darwin: `$HOME/Library/Preferences`
/// - windows: `APPDATA`
///
/// Empty values count as unset.
pub fn config_dir_for<F>(variant: PlatformVariant, lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    match variant {
        PlatformVariant::Linux => get("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| get("HOME").map(|home| PathBuf::from(home).join(".config"))),
        PlatformVariant::Darwin => {
            get("HOME").map(|home| PathBuf::from(home).join("Library").join("Preferences"))
        }
        PlatformVariant::Windows => get("APPDATA").map(PathBuf::from),
    }
}

/// Resolve the config directory for the current platform.
///
/// Falls back to the OS-reported home directory when `HOME` is unset.
/// Returns `None` when nothing resolves; callers must then require an
/// explicit path.
pub fn resolve_config_dir() -> Option<PathBuf> {
    config_dir_for(PlatformVariant::current(), |key| {
        env::var(key).ok().or_else(|| {
            if key == "HOME" {
                dirs::home_dir().map(|home| home.to_string_lossy().into_owned())
            } else {
                None
            }
        })
    })
}
