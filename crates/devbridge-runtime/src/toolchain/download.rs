//! Toolchain archive download and extraction.
//!
//! The archive is fetched in one request (no retries), buffered in memory,
//! and unpacked entry by entry under the install directory.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::Path;

use devbridge_core::PlatformVariant;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use super::error::ToolchainError;

/// Progress callback, called with (`downloaded_bytes`, `total_bytes`).
/// `total_bytes` is 0 when the server sends no content length.
pub type ProgressCallback<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Archive URL for `variant`: `<base_url><os>.zip`.
pub fn archive_url(base_url: &str, variant: PlatformVariant) -> String {
    format!("{base_url}{}.zip", variant.os_name())
}

/// Fetch `url` into memory.
///
/// A non-success status fails with [`ToolchainError::Network`] carrying the
/// URL and status code.
pub async fn fetch_archive(
    client: &Client,
    url: &str,
    progress: Option<ProgressCallback<'_>>,
) -> Result<Vec<u8>, ToolchainError> {
    let request_error = |source| ToolchainError::Request {
        url: url.to_string(),
        source,
    };

    let response = client
        .get(url)
        .header("User-Agent", "devbridge")
        .send()
        .await
        .map_err(request_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ToolchainError::Network {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total = response.content_length().unwrap_or(0);
    let mut bytes = Vec::with_capacity(usize::try_from(total).unwrap_or(0));
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(request_error)?;
        bytes.extend_from_slice(&chunk);
        if let Some(cb) = progress {
            cb(bytes.len() as u64, total);
        }
    }

    debug!(%url, bytes = bytes.len(), "archive downloaded");
    Ok(bytes)
}

/// Extract every entry of a zip archive under `dest`.
///
/// Directory-marker entries become directories; parent directories of file
/// entries are created as needed. Entries whose names would escape `dest`
/// are skipped. Returns the number of files written.
pub fn extract_archive(bytes: &[u8], dest: &Path) -> Result<usize, ToolchainError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    fs::create_dir_all(dest)?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(name = %entry.name(), "skipping archive entry outside install dir");
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&target)?;
        io::copy(&mut entry, &mut file)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777))?;
        }

        written += 1;
    }

    debug!(dest = %dest.display(), files = written, "archive extracted");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, Option<&[u8]>)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = SimpleFileOptions::default().unix_permissions(0o755);
            for (name, data) in entries {
                match data {
                    Some(data) => {
                        writer.start_file(*name, options).unwrap();
                        writer.write_all(data).unwrap();
                    }
                    None => writer.add_directory(*name, options).unwrap(),
                }
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn url_appends_os_and_extension() {
        assert_eq!(
            archive_url("https://example.test/tools-", PlatformVariant::Darwin),
            "https://example.test/tools-darwin.zip"
        );
        assert_eq!(
            archive_url("https://example.test/tools-", PlatformVariant::Windows),
            "https://example.test/tools-windows.zip"
        );
    }

    #[test]
    fn extracts_nested_entries_and_directory_markers() {
        let bytes = build_zip(&[
            ("platform-tools/", None),
            ("platform-tools/adb", Some(b"#!/bin/sh\n")),
            ("platform-tools/lib64/libc++.so", Some(b"lib")),
        ]);
        let dir = tempfile::tempdir().unwrap();

        let written = extract_archive(&bytes, dir.path()).unwrap();
        assert_eq!(written, 2);
        assert!(dir.path().join("platform-tools").is_dir());
        assert!(dir.path().join("platform-tools/lib64/libc++.so").is_file());
    }

    #[test]
    #[cfg(unix)]
    fn preserves_unix_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let bytes = build_zip(&[("platform-tools/adb", Some(b"#!/bin/sh\n"))]);
        let dir = tempfile::tempdir().unwrap();
        extract_archive(&bytes, dir.path()).unwrap();

        let mode = fs::metadata(dir.path().join("platform-tools/adb"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn rejects_garbage_archives() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_archive(b"not a zip", dir.path()).unwrap_err();
        assert!(matches!(err, ToolchainError::Archive(_)));
    }
}
