use crate::error::{Error, ExtractionError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::shared::{
    collect_extracted_files, ensure_dest, failed, is_password_error, validate_extracted_paths,
};

/// Archive extractor for 7z files (.7z, .cb7)
pub struct SevenZipExtractor;

impl SevenZipExtractor {
    /// Extract a 7z archive into `dest_path`
    ///
    /// The decoder writes straight to disk, so the destination is validated
    /// for path traversal afterwards and then scanned for the file list.
    pub fn try_extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting 7z extraction");

        ensure_dest(dest_path)?;

        match sevenz_rust::decompress_file(archive_path, dest_path) {
            Ok(()) => {
                validate_extracted_paths(archive_path, dest_path)?;
                let extracted_files = collect_extracted_files(dest_path)?;

                info!(
                    ?archive_path,
                    extracted_count = extracted_files.len(),
                    "7z extraction successful"
                );
                Ok(extracted_files)
            }
            Err(e) => {
                let err_str = e.to_string();
                if is_password_error(&err_str) {
                    Err(Error::Extraction(ExtractionError::PasswordProtected {
                        archive: archive_path.to_path_buf(),
                    }))
                } else {
                    Err(failed(
                        archive_path,
                        format!("failed to extract 7z archive: {err_str}"),
                    ))
                }
            }
        }
    }
}
