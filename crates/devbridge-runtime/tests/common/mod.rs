//! Shared fixtures for runtime integration tests.
//!
//! Fakes are small `/bin/sh` scripts, so the tests using them are unix-only.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use devbridge_runtime::{AutomationConfig, DeviceHub, ToolchainProvisioner};
use zip::write::SimpleFileOptions;

/// Archive name the provisioner requests on Linux.
pub const LINUX_ARCHIVE: &str = "platform-tools-latest-linux.zip";

/// A fake `adb` that understands the subcommands the runtime issues.
pub const FAKE_ADB: &str = r#"#!/bin/sh
if [ "$1" = "-s" ]; then
  shift 2
fi
case "$1" in
  version)
    echo "Android Debug Bridge version 1.0.41"
    ;;
  devices)
    printf 'List of devices attached\nemulator-5554\tdevice\n\n'
    ;;
  shell)
    shift
    case "$*" in
      "getprop sys.boot_completed") echo 1 ;;
      "input keyevent 82") ;;
      *com.missing*) echo "** Error: no activities found for com.missing" ;;
      monkey*) echo "Events injected: 1" ;;
      "am force-stop"*) ;;
      *) echo "unsupported shell command: $*" >&2; exit 1 ;;
    esac
    ;;
  *)
    echo "adb: unknown command $1" >&2
    exit 1
    ;;
esac
"#;

/// A fake `adb` whose device never finishes booting and has nothing attached.
pub const FAKE_ADB_BOOTING: &str = r#"#!/bin/sh
if [ "$1" = "-s" ]; then
  shift 2
fi
case "$1" in
  devices) printf 'List of devices attached\n' ;;
  shell) echo 0 ;;
  *) exit 0 ;;
esac
"#;

/// A server that prints the readiness marker and keeps running.
pub const FAKE_SERVER_READY: &str = r#"#!/bin/sh
echo "[Appium] Welcome to Appium v2.5.1"
echo "[Appium] Appium REST http interface listener started on http://0.0.0.0:$2"
echo "[Appium] listening" >&2
exec sleep 30
"#;

/// A server that never reports readiness.
pub const FAKE_SERVER_SILENT: &str = r#"#!/bin/sh
echo "[Appium] Welcome to Appium v2.5.1"
exec sleep 30
"#;

/// A server that becomes ready and then exits on its own.
pub const FAKE_SERVER_SHORT_LIVED: &str = r#"#!/bin/sh
echo "[Appium] Appium REST http interface listener started on http://0.0.0.0:$2"
sleep 0.3
exit 3
"#;

/// A server that dies during startup.
pub const FAKE_SERVER_CRASH: &str = r#"#!/bin/sh
echo "Error: Cannot find module 'appium-uiautomator2-driver'" >&2
exit 1
"#;

/// Write an executable script at `path`, creating parent directories.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_path_buf()
}

/// Install a fake `adb` under `install_dir/platform-tools/adb`.
#[cfg(unix)]
pub fn install_fake_adb(install_dir: &Path, body: &str) -> PathBuf {
    write_script(&install_dir.join("platform-tools").join("adb"), body)
}

/// Zip archive laid out like the real platform-tools download.
pub fn platform_tools_zip(adb_body: &str) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        writer.add_directory("platform-tools/", options).unwrap();
        writer.start_file("platform-tools/adb", options).unwrap();
        writer.write_all(adb_body.as_bytes()).unwrap();
        writer
            .start_file("platform-tools/NOTICE.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"notice").unwrap();
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

/// An in-process archive server.
pub struct ArchiveServer {
    pub base_url: String,
    pub hits: Arc<AtomicUsize>,
}

impl ArchiveServer {
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serve `archive` at `/platform-tools-latest-linux.zip`; everything else is 404.
pub async fn serve_archive(archive: Vec<u8>) -> ArchiveServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().route(
        &format!("/{LINUX_ARCHIVE}"),
        get(move || {
            let counter = Arc::clone(&counter);
            let archive = archive.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::OK, archive)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ArchiveServer {
        base_url: format!("http://{addr}/platform-tools-latest-"),
        hits,
    }
}

/// A hub whose provisioner never reaches the network.
pub fn offline_hub() -> DeviceHub {
    DeviceHub::new(ToolchainProvisioner::new().with_base_url("http://127.0.0.1:9/unreachable-"))
}

/// Orchestrator config with short bounds, pointing at a fake server and toolchain.
pub fn fast_config(server_binary: &Path, install_dir: &Path) -> AutomationConfig {
    AutomationConfig {
        server_binary: server_binary.to_string_lossy().into_owned(),
        install_dir: Some(install_dir.to_path_buf()),
        port_wait: Duration::from_millis(500),
        port_poll_interval: Duration::from_millis(50),
        startup_timeout: Duration::from_secs(5),
        readiness_poll_interval: Duration::from_millis(20),
        stop_grace: Duration::from_millis(500),
        device_timeout: Duration::from_secs(2),
        device_poll_interval: Duration::from_millis(20),
        connect_retry_delay: Duration::from_millis(10),
        app_settle_delay: Duration::ZERO,
        app_close_delay: Duration::ZERO,
        ..AutomationConfig::default()
    }
}
