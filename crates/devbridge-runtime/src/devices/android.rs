//! Android device bridge backed by the platform-tools `adb` binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use devbridge_core::domain::UNKNOWN_DEVICE_STATUS;
use devbridge_core::{DeviceKind, DeviceList, DeviceRecord, ProcessOutput};
use tracing::debug;

use super::DeviceBridge;
use crate::process::ProcessSupervisor;
use crate::toolchain::{ToolchainError, ToolchainProvisioner};

/// Per-call options for [`AndroidBridge::invoke`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Toolchain install dir; the provisioner's default when `None`.
    pub install_dir: Option<PathBuf>,
    /// Target device; adds `-s <serial>` when set.
    pub serial: Option<String>,
}

impl InvokeOptions {
    pub fn for_serial(serial: impl Into<String>) -> Self {
        Self {
            serial: Some(serial.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct AndroidBridge {
    provisioner: ToolchainProvisioner,
}

impl AndroidBridge {
    pub const fn new(provisioner: ToolchainProvisioner) -> Self {
        Self { provisioner }
    }

    pub const fn provisioner(&self) -> &ToolchainProvisioner {
        &self.provisioner
    }

    /// Path of an installed, executable `adb`.
    pub fn binary(&self, install_dir: Option<&Path>) -> Result<PathBuf, ToolchainError> {
        let installation = self.provisioner.installation(install_dir)?;
        if !installation.is_ready() {
            return Err(ToolchainError::NotInstalled {
                path: installation.binary_path,
            });
        }
        Ok(installation.binary_path)
    }

    /// Run `adb [-s serial] args..` to completion.
    ///
    /// Returns stderr text when the exit code is non-zero and stdout text
    /// otherwise. Only spawn failures and a missing binary are errors.
    pub async fn invoke<I, S>(&self, options: &InvokeOptions, args: I) -> Result<String, ToolchainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let output = self.invoke_raw(options, args).await?;
        Ok(if output.success() {
            output.stdout_text()
        } else {
            output.stderr_text()
        })
    }

    /// Like [`invoke`](Self::invoke) but a non-zero exit is an error.
    pub async fn invoke_checked<I, S>(
        &self,
        options: &InvokeOptions,
        args: I,
    ) -> Result<String, ToolchainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let binary = self.binary(options.install_dir.as_deref())?;
        let args = command_args(options.serial.as_deref(), args);
        let output = ProcessSupervisor::new()
            .run_checked(&binary.to_string_lossy(), &args)
            .await?;
        Ok(output.stdout_text())
    }

    async fn invoke_raw<I, S>(&self, options: &InvokeOptions, args: I) -> Result<ProcessOutput, ToolchainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let binary = self.binary(options.install_dir.as_deref())?;
        let args = command_args(options.serial.as_deref(), args);
        debug!(binary = %binary.display(), ?args, "invoking adb");
        let output = ProcessSupervisor::new()
            .run_to_completion(&binary.to_string_lossy(), &args)
            .await?;
        Ok(output)
    }

    /// Attached devices, serial to status, in the order `adb devices` lists them.
    pub async fn list_devices(&self, options: &InvokeOptions) -> Result<DeviceList, ToolchainError> {
        let output = self.invoke(options, ["devices"]).await?;
        Ok(parse_device_list(&output))
    }

    /// Copy `device_path` from the device to `host_path`.
    pub async fn pull(
        &self,
        device_path: &str,
        host_path: &Path,
        options: &InvokeOptions,
    ) -> Result<String, ToolchainError> {
        let host = host_path.to_string_lossy();
        self.invoke(options, ["pull", device_path, &*host])
            .await
    }

    /// Copy `host_path` onto the device at `device_path`.
    pub async fn push(
        &self,
        host_path: &Path,
        device_path: &str,
        options: &InvokeOptions,
    ) -> Result<String, ToolchainError> {
        let host = host_path.to_string_lossy();
        self.invoke(options, ["push", &*host, device_path])
            .await
    }

    pub async fn mkdir(&self, device_path: &str, options: &InvokeOptions) -> Result<String, ToolchainError> {
        let script = format!("mkdir -p {}", fix_device_path(device_path));
        self.invoke(options, ["shell", script.as_str()]).await
    }

    pub async fn rm(&self, device_path: &str, options: &InvokeOptions) -> Result<String, ToolchainError> {
        let script = format!("rm -rf {}", fix_device_path(device_path));
        self.invoke(options, ["shell", script.as_str()]).await
    }

    pub async fn ls(&self, device_path: &str, options: &InvokeOptions) -> Result<String, ToolchainError> {
        let script = format!("ls {}", fix_device_path(device_path));
        self.invoke(options, ["shell", script.as_str()]).await
    }

    pub async fn install_apk(&self, apk_path: &Path, options: &InvokeOptions) -> Result<String, ToolchainError> {
        let apk = apk_path.to_string_lossy();
        self.invoke(options, ["install", &*apk]).await
    }

    pub async fn uninstall_apk(&self, package: &str, options: &InvokeOptions) -> Result<String, ToolchainError> {
        self.invoke(options, ["uninstall", package]).await
    }

    /// Whether the device reports `sys.boot_completed == 1`.
    pub async fn boot_completed(&self, options: &InvokeOptions) -> Result<bool, ToolchainError> {
        let output = self
            .invoke(options, ["shell", "getprop", "sys.boot_completed"])
            .await?;
        Ok(output.trim() == "1")
    }

    /// Send a key event (82 is the menu key, which dismisses the lock screen).
    pub async fn send_keyevent(&self, code: u32, options: &InvokeOptions) -> Result<String, ToolchainError> {
        let code = code.to_string();
        self.invoke(options, ["shell", "input", "keyevent", code.as_str()])
            .await
    }
}

#[async_trait]
impl DeviceBridge for AndroidBridge {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Android
    }

    async fn devices(&self, options: &InvokeOptions) -> Result<DeviceList, ToolchainError> {
        self.list_devices(options).await
    }
}

/// `["-s", serial, args..]` when a serial is given, else just `args`.
pub fn command_args<I, S>(serial: Option<&str>, args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut full = Vec::new();
    if let Some(serial) = serial {
        full.push("-s".to_string());
        full.push(serial.to_string());
    }
    full.extend(args.into_iter().map(|a| a.as_ref().to_string()));
    full
}

/// Absolute, double-quoted device path for shell commands.
pub fn fix_device_path(path: &str) -> String {
    if path.starts_with('/') {
        format!("\"{path}\"")
    } else {
        format!("\"/{path}\"")
    }
}

const DEVICE_LIST_HEADER: &str = "List of devices";

/// Parse `adb devices` output.
///
/// The `List of devices attached` header and daemon notices
/// (`* daemon started ...`) are skipped wherever they appear.
/// A missing or single-character status becomes `"unknown"`.
pub fn parse_device_list(output: &str) -> DeviceList {
    let mut header_seen = false;
    let records = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('*'))
        .filter(|line| {
            if !header_seen && line.starts_with(DEVICE_LIST_HEADER) {
                header_seen = true;
                return false;
            }
            true
        })
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let status = parts
                .next()
                .filter(|status| status.len() > 1)
                .unwrap_or(UNKNOWN_DEVICE_STATUS);
            Some(DeviceRecord {
                serial: serial.to_string(),
                status: status.to_string(),
            })
        });
    devbridge_core::domain::device_list_from(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_device() {
        let list = parse_device_list("List of devices attached\nemulator-5554\tdevice\n");
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("emulator-5554").map(String::as_str), Some("device"));
    }

    #[test]
    fn skips_daemon_notices_and_blank_lines() {
        let output = "* daemon not running; starting now at tcp:5037\n\
                      * daemon started successfully\n\
                      List of devices attached\n\
                      \n\
                      R58M12ABCDE\tunauthorized\n\
                      emulator-5556\toffline\n";
        let list = parse_device_list(output);
        assert!(!list.contains_key("*"));
        assert!(!list.contains_key("List"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.keys().next().map(String::as_str), Some("R58M12ABCDE"));
        assert_eq!(list.get("R58M12ABCDE").map(String::as_str), Some("unauthorized"));
        assert_eq!(list.get("emulator-5556").map(String::as_str), Some("offline"));
    }

    #[test]
    fn trailing_daemon_notice_is_skipped() {
        let output = "List of devices attached\nemulator-5554\tdevice\n* daemon started\n";
        let list = parse_device_list(output);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("emulator-5554").map(String::as_str), Some("device"));
    }

    #[test]
    fn short_or_missing_status_is_unknown() {
        let list = parse_device_list("List of devices attached\nabc\t?\ndef\n");
        assert_eq!(list.get("abc").map(String::as_str), Some("unknown"));
        assert_eq!(list.get("def").map(String::as_str), Some("unknown"));
    }

    #[test]
    fn header_only_is_empty() {
        assert!(parse_device_list("List of devices attached\n\n").is_empty());
        assert!(parse_device_list("").is_empty());
    }

    #[test]
    fn serial_prefix() {
        assert_eq!(
            command_args(Some("emulator-5554"), ["shell", "ls"]),
            vec!["-s", "emulator-5554", "shell", "ls"]
        );
        assert_eq!(command_args(None, ["devices"]), vec!["devices"]);
    }

    #[test]
    fn device_paths_are_absolute_and_quoted() {
        assert_eq!(fix_device_path("sdcard/Download"), "\"/sdcard/Download\"");
        assert_eq!(fix_device_path("/data/local/tmp"), "\"/data/local/tmp\"");
    }

    #[tokio::test]
    async fn invoke_without_installation_is_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = AndroidBridge::new(ToolchainProvisioner::new());
        let options = InvokeOptions::default().with_install_dir(dir.path());
        let err = bridge.invoke(&options, ["version"]).await.unwrap_err();
        assert!(matches!(err, ToolchainError::NotInstalled { .. }));
    }
}
