use std::path::{Path, PathBuf};

use devbridge_core::paths::{default_toolchain_dir, ensure_directory};
use devbridge_core::settings::DEFAULT_TOOLCHAIN_BASE_URL;
use devbridge_core::{BridgeSettings, EnvOverlay, PathError, PlatformVariant, ToolInstallation};
use reqwest::Client;
use tracing::{debug, info};

use super::download::{ProgressCallback, archive_url, extract_archive, fetch_archive};
use super::error::ToolchainError;

/// Resolves, downloads and unpacks the device-bridge toolchain.
#[derive(Debug, Clone)]
pub struct ToolchainProvisioner {
    client: Client,
    base_url: String,
    variant: PlatformVariant,
    default_dir: Option<PathBuf>,
}

impl Default for ToolchainProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolchainProvisioner {
    /// Provisioner for the current platform using the default archive URL
    /// and the platform config directory.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_TOOLCHAIN_BASE_URL.to_string(),
            variant: PlatformVariant::current(),
            default_dir: default_toolchain_dir().ok(),
        }
    }

    pub fn from_settings(settings: &BridgeSettings) -> Self {
        let default_dir = settings
            .toolchain_dir
            .clone()
            .or_else(|| default_toolchain_dir().ok());
        Self {
            base_url: settings.effective_toolchain_base_url().to_string(),
            default_dir,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_default_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn with_variant(mut self, variant: PlatformVariant) -> Self {
        self.variant = variant;
        self
    }

    pub const fn variant(&self) -> PlatformVariant {
        self.variant
    }

    pub fn archive_url(&self) -> String {
        archive_url(&self.base_url, self.variant)
    }

    /// Installation layout under `install_dir`, or under the default dir.
    ///
    /// Fails when neither is available so callers can ask for an explicit path.
    pub fn installation(&self, install_dir: Option<&Path>) -> Result<ToolInstallation, ToolchainError> {
        let dir = match install_dir {
            Some(dir) => dir.to_path_buf(),
            None => self.default_dir.clone().ok_or_else(|| PathError::NoConfigDir {
                platform: self.variant.to_string(),
            })?,
        };
        Ok(ToolInstallation::android(dir, self.variant))
    }

    pub fn is_installed(&self, install_dir: Option<&Path>) -> bool {
        self.installation(install_dir)
            .is_ok_and(|installation| installation.is_ready())
    }

    /// Download and unpack the archive into `dest_dir`, returning the binary path.
    pub async fn download(&self, dest_dir: Option<&Path>) -> Result<PathBuf, ToolchainError> {
        self.download_with_progress(dest_dir, None).await
    }

    pub async fn download_with_progress(
        &self,
        dest_dir: Option<&Path>,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<PathBuf, ToolchainError> {
        let installation = self.installation(dest_dir)?;
        ensure_directory(&installation.install_dir)?;

        let url = self.archive_url();
        info!(%url, dest = %installation.install_dir.display(), "downloading toolchain");
        let bytes = fetch_archive(&self.client, &url, progress).await?;
        extract_archive(&bytes, &installation.install_dir)?;
        ensure_executable(&installation.binary_path)?;

        if !installation.is_ready() {
            return Err(ToolchainError::NotInstalled {
                path: installation.binary_path,
            });
        }
        info!(binary = %installation.binary_path.display(), "toolchain installed");
        Ok(installation.binary_path)
    }

    /// Provision unless an installation is already present. `force` always
    /// re-downloads.
    pub async fn ensure_installed(
        &self,
        install_dir: Option<&Path>,
        force: bool,
    ) -> Result<ToolInstallation, ToolchainError> {
        self.ensure_installed_with_progress(install_dir, force, None)
            .await
    }

    pub async fn ensure_installed_with_progress(
        &self,
        install_dir: Option<&Path>,
        force: bool,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ToolInstallation, ToolchainError> {
        let installation = self.installation(install_dir)?;
        if installation.is_ready() && !force {
            debug!(binary = %installation.binary_path.display(), "toolchain already installed");
            return Ok(installation);
        }
        self.download_with_progress(Some(&installation.install_dir), progress)
            .await?;
        Ok(installation)
    }

    /// Provision if needed and build the environment overlay for the toolchain.
    ///
    /// `current_path` defaults to this process's `PATH`.
    pub async fn setup_environment(
        &self,
        install_dir: Option<&Path>,
        current_path: Option<&str>,
    ) -> Result<EnvOverlay, ToolchainError> {
        let installation = self.ensure_installed(install_dir, false).await?;
        let inherited = std::env::var("PATH").unwrap_or_default();
        let overlay =
            EnvOverlay::for_installation(&installation, current_path.unwrap_or(&inherited));
        debug!(android_home = %overlay.android_home, "environment overlay ready");
        Ok(overlay)
    }
}

/// Archives built without unix modes leave the binary non-executable.
#[cfg(unix)]
fn ensure_executable(path: &Path) -> Result<(), ToolchainError> {
    use std::os::unix::fs::PermissionsExt;

    let Ok(metadata) = std::fs::metadata(path) else {
        return Ok(());
    };
    let mode = metadata.permissions().mode();
    if mode & 0o111 == 0 {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode | 0o755))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Path) -> Result<(), ToolchainError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installation_prefers_explicit_dir() {
        let provisioner = ToolchainProvisioner::new()
            .with_default_dir("/default")
            .with_variant(PlatformVariant::Linux);
        let installation = provisioner.installation(Some(Path::new("/explicit"))).unwrap();
        assert_eq!(installation.install_dir, PathBuf::from("/explicit"));

        let installation = provisioner.installation(None).unwrap();
        assert_eq!(
            installation.binary_path,
            PathBuf::from("/default/platform-tools/adb")
        );
    }

    #[test]
    fn missing_default_dir_requires_explicit_path() {
        let mut provisioner = ToolchainProvisioner::new();
        provisioner.default_dir = None;
        assert!(matches!(
            provisioner.installation(None),
            Err(ToolchainError::Path(PathError::NoConfigDir { .. }))
        ));
        assert!(!provisioner.is_installed(None));
    }

    #[test]
    fn archive_url_follows_variant() {
        let provisioner = ToolchainProvisioner::new()
            .with_base_url("http://127.0.0.1:9/pt-")
            .with_variant(PlatformVariant::Linux);
        assert_eq!(provisioner.archive_url(), "http://127.0.0.1:9/pt-linux.zip");
    }

    #[test]
    fn settings_override_dir_and_url() {
        let settings = BridgeSettings {
            toolchain_dir: Some(PathBuf::from("/srv/sdk")),
            toolchain_base_url: Some("http://mirror.test/pt-".to_string()),
            ..Default::default()
        };
        let provisioner = ToolchainProvisioner::from_settings(&settings);
        assert!(provisioner.archive_url().starts_with("http://mirror.test/pt-"));
        assert_eq!(
            provisioner.installation(None).unwrap().install_dir,
            PathBuf::from("/srv/sdk")
        );
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn existing_installation_is_not_redownloaded() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("platform-tools");
        std::fs::create_dir_all(&tools).unwrap();
        let adb = tools.join("adb");
        std::fs::write(&adb, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&adb, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Unroutable URL: any download attempt would fail.
        let provisioner = ToolchainProvisioner::new()
            .with_base_url("http://127.0.0.1:9/none-")
            .with_variant(PlatformVariant::Linux);
        let installation = provisioner
            .ensure_installed(Some(dir.path()), false)
            .await
            .unwrap();
        assert_eq!(installation.binary_path, adb);

        let overlay = provisioner
            .setup_environment(Some(dir.path()), Some("/usr/bin"))
            .await
            .unwrap();
        assert_eq!(overlay.android_home, dir.path().to_string_lossy());
        assert!(overlay.path.starts_with("/usr/bin:"));
        assert!(overlay.path.ends_with("platform-tools"));
    }
}
