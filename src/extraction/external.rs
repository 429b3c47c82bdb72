//! Fallback extractor driving an external 7-Zip compatible binary

use crate::error::{Error, ExtractionError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::shared::{
    collect_extracted_files, ensure_dest, is_password_error, validate_extracted_paths,
};

/// Binary names probed on `PATH`, in order
pub const SEVEN_ZIP_BINARIES: &[&str] = &["7z", "7zz", "7za"];

/// Extractor for catalog formats without a native decoder
///
/// Runs `7z x -y -bd -o<dest> <archive>`. 7-Zip reads cab, iso, cpio, deb,
/// rpm, arj, lzh, Z and several more, which covers most of the catalog.
#[derive(Debug, Clone)]
pub struct ExternalExtractor {
    binary_path: PathBuf,
}

impl ExternalExtractor {
    /// Create an extractor with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find a 7-Zip binary in `PATH`
    pub fn from_path() -> Option<Self> {
        SEVEN_ZIP_BINARIES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
    }

    /// Path of the binary that will be executed
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Extract `archive_path` into `dest_path`
    pub fn try_extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(
            ?archive_path,
            ?dest_path,
            binary = ?self.binary_path,
            "attempting external extraction"
        );

        ensure_dest(dest_path)?;

        // stdin is closed so an encrypted archive fails instead of prompting
        let mut dest_arg = std::ffi::OsString::from("-o");
        dest_arg.push(dest_path.as_os_str());
        let output = Command::new(&self.binary_path)
            .arg("x")
            .arg("-y")
            .arg("-bd")
            .arg(dest_arg)
            .arg(archive_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Error::ExternalTool(format!(
                    "failed to execute {}: {e}",
                    self.binary_path.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            if is_password_error(&message) {
                return Err(Error::Extraction(ExtractionError::PasswordProtected {
                    archive: archive_path.to_path_buf(),
                }));
            }
            return Err(Error::Extraction(ExtractionError::Failed {
                archive: archive_path.to_path_buf(),
                reason: format!(
                    "{} exited with {}: {message}",
                    self.binary_path.display(),
                    output.status
                ),
            }));
        }

        validate_extracted_paths(archive_path, dest_path)?;
        let extracted_files = collect_extracted_files(dest_path)?;

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "external extraction successful"
        );

        Ok(extracted_files)
    }
}
