use crate::error::{Error, ExtractionError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::shared::{ensure_dest, failed, is_password_error, sanitize_entry_path};

/// Archive extractor for RAR files (.rar, .cbr)
pub struct RarExtractor;

impl RarExtractor {
    /// Convert an unrar error to our error type, checking for password errors
    fn convert_unrar_error(e: unrar::error::UnrarError, archive_path: &Path) -> Error {
        let err_str = e.to_string();
        if is_password_error(&err_str) || err_str.contains("ERAR_MISSING_PASSWORD") {
            Error::Extraction(ExtractionError::PasswordProtected {
                archive: archive_path.to_path_buf(),
            })
        } else {
            failed(archive_path, err_str)
        }
    }

    /// Extract a RAR archive into `dest_path`
    pub fn try_extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting RAR extraction");

        ensure_dest(dest_path)?;

        let processor = unrar::Archive::new(archive_path)
            .open_for_processing()
            .map_err(|e| Self::convert_unrar_error(e, archive_path))?;

        let mut extracted_files = Vec::new();

        // The unrar API is a typestate machine: header -> file -> header
        let mut at_header = processor;
        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(entry_processor)) => entry_processor,
                Ok(None) => break,
                Err(e) => return Err(Self::convert_unrar_error(e, archive_path)),
            };

            let header = at_file.entry();

            let Some(sanitized) = sanitize_entry_path(&header.filename) else {
                warn!(?archive_path, entry = ?header.filename, "skipping entry with unsafe path");
                at_header = at_file.skip().map_err(|e| {
                    failed(archive_path, format!("failed to skip unsafe entry: {e}"))
                })?;
                continue;
            };

            let file_path = dest_path.join(&sanitized);

            if header.is_directory() {
                std::fs::create_dir_all(&file_path)
                    .map_err(|e| Error::filesystem("create directory", &file_path, e))?;
                at_header = at_file
                    .skip()
                    .map_err(|e| failed(archive_path, format!("failed to skip directory: {e}")))?;
            } else {
                if let Some(parent) = file_path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| Error::filesystem("create directory", parent, e))?;
                }
                at_header = at_file
                    .extract_to(&file_path)
                    .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
                extracted_files.push(file_path);
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "RAR extraction successful"
        );

        Ok(extracted_files)
    }
}
