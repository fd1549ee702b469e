//! Toolchain installation types.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Subdirectory of an install dir holding the bridge binaries.
pub const PLATFORM_TOOLS_DIR: &str = "platform-tools";

/// Operating system family a toolchain archive is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformVariant {
    Linux,
    Darwin,
    Windows,
}

impl PlatformVariant {
    /// Variant for the platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        #[cfg(target_os = "windows")]
        {
            Self::Windows
        }
        #[cfg(target_os = "macos")]
        {
            Self::Darwin
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            Self::Linux
        }
    }

    /// Name used in archive file names.
    #[must_use]
    pub const fn os_name(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }

    /// Separator for `PATH`-style lists.
    #[must_use]
    pub const fn path_list_separator(&self) -> char {
        match self {
            Self::Windows => ';',
            Self::Linux | Self::Darwin => ':',
        }
    }

    /// File name of an executable on this platform.
    pub fn executable_name(&self, stem: &str) -> String {
        match self {
            Self::Windows => format!("{stem}.exe"),
            Self::Linux | Self::Darwin => stem.to_string(),
        }
    }
}

impl std::fmt::Display for PlatformVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.os_name())
    }
}

/// An on-disk toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInstallation {
    pub install_dir: PathBuf,
    pub binary_path: PathBuf,
    pub platform_variant: PlatformVariant,
}

impl ToolInstallation {
    /// Describe the bridge binary (`adb`) layout under `install_dir`.
    pub fn android(install_dir: impl Into<PathBuf>, platform_variant: PlatformVariant) -> Self {
        let install_dir = install_dir.into();
        let binary_path = install_dir
            .join(PLATFORM_TOOLS_DIR)
            .join(platform_variant.executable_name("adb"));
        Self {
            install_dir,
            binary_path,
            platform_variant,
        }
    }

    /// Directory that must be on `PATH` for tools to find the bridge.
    pub fn tools_dir(&self) -> PathBuf {
        self.install_dir.join(PLATFORM_TOOLS_DIR)
    }

    /// Whether the binary exists and can be executed.
    pub fn is_ready(&self) -> bool {
        is_executable(&self.binary_path)
    }
}

/// Environment variables that point child processes at a toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvOverlay {
    #[serde(rename = "ANDROID_HOME")]
    pub android_home: String,
    #[serde(rename = "ANDROID_SDK_ROOT")]
    pub android_sdk_root: String,
    #[serde(rename = "PATH")]
    pub path: String,
}

impl EnvOverlay {
    /// Build the overlay for an installation, extending `current_path`.
    pub fn for_installation(installation: &ToolInstallation, current_path: &str) -> Self {
        let home = installation.install_dir.to_string_lossy().into_owned();
        let tools = installation.tools_dir().to_string_lossy().into_owned();
        let separator = installation.platform_variant.path_list_separator();
        let path = if current_path.is_empty() {
            tools
        } else {
            format!("{current_path}{separator}{tools}")
        };
        Self {
            android_home: home.clone(),
            android_sdk_root: home,
            path,
        }
    }

    /// Key/value pairs suitable for `Command::envs`.
    pub fn vars(&self) -> [(&'static str, &str); 3] {
        [
            ("ANDROID_HOME", self.android_home.as_str()),
            ("ANDROID_SDK_ROOT", self.android_sdk_root.as_str()),
            ("PATH", self.path.as_str()),
        ]
    }
}

/// Whether `path` is a regular file with an execute bit (any file on Windows).
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}
