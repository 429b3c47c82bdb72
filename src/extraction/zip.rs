use crate::error::{Error, ExtractionError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::shared::{ensure_dest, failed, is_password_error};

/// Archive extractor for ZIP files (.zip, .jar, .cbz)
pub struct ZipExtractor;

impl ZipExtractor {
    /// Open a ZIP entry by index, mapping encryption errors to `PasswordProtected`
    fn open_zip_entry<'a>(
        archive: &'a mut zip::ZipArchive<std::fs::File>,
        index: usize,
        archive_path: &Path,
    ) -> Result<zip::read::ZipFile<'a>> {
        archive.by_index(index).map_err(|e| {
            let err_str = e.to_string();
            if is_password_error(&err_str) {
                Error::Extraction(ExtractionError::PasswordProtected {
                    archive: archive_path.to_path_buf(),
                })
            } else {
                failed(archive_path, format!("failed to read ZIP entry: {e}"))
            }
        })
    }

    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        mut file: zip::read::ZipFile,
        dest_path: &Path,
        archive_path: &Path,
    ) -> Result<Option<PathBuf>> {
        let file_path = match file.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                warn!(?archive_path, entry = file.name(), "skipping entry with unsafe path");
                return Ok(None);
            }
        };

        if file.is_dir() {
            std::fs::create_dir_all(&file_path)
                .map_err(|e| Error::filesystem("create directory", &file_path, e))?;
            return Ok(None);
        }

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::filesystem("create directory", parent, e))?;
        }

        let mut outfile = std::fs::File::create(&file_path)
            .map_err(|e| Error::filesystem("create file", &file_path, e))?;

        // Read errors here are decoder errors (bad CRC, truncated data)
        std::io::copy(&mut file, &mut outfile).map_err(|e| {
            failed(
                archive_path,
                format!("failed to extract {}: {e}", file_path.display()),
            )
        })?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            // Never drop the owner's read/write bits, cleanup must stay possible
            let mode = (mode & 0o7777) | 0o600;
            std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| Error::filesystem("set permissions", &file_path, e))?;
        }

        Ok(Some(file_path))
    }

    /// Extract a ZIP archive into `dest_path`
    pub fn try_extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        ensure_dest(dest_path)?;

        let file = std::fs::File::open(archive_path)
            .map_err(|e| Error::filesystem("open", archive_path, e))?;

        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| failed(archive_path, format!("failed to read ZIP archive: {e}")))?;

        let mut extracted_files = Vec::new();
        for i in 0..archive.len() {
            let file = Self::open_zip_entry(&mut archive, i, archive_path)?;
            if let Some(file_path) = Self::extract_zip_entry(file, dest_path, archive_path)? {
                extracted_files.push(file_path);
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "ZIP extraction successful"
        );

        Ok(extracted_files)
    }
}
