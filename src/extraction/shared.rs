use crate::error::{Error, ExtractionError, Result};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Create the destination directory if it doesn't exist
pub(crate) fn ensure_dest(dest_path: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_path)
        .map_err(|e| Error::filesystem("create destination", dest_path, e))
}

/// Keep only normal components of an entry path
///
/// Returns `None` for entries with no usable component (e.g. pure `..`).
pub(crate) fn sanitize_entry_path(entry: &Path) -> Option<PathBuf> {
    let sanitized = entry
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect::<PathBuf>();
    (!sanitized.as_os_str().is_empty()).then_some(sanitized)
}

/// Build an [`ExtractionError::Failed`] for `archive_path`
pub(crate) fn failed(archive_path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::Extraction(ExtractionError::Failed {
        archive: archive_path.to_path_buf(),
        reason: reason.to_string(),
    })
}

/// Whether a decoder message points at an encrypted archive
pub(crate) fn is_password_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("password") || lower.contains("encrypted")
}

/// Recursively collect all files (not directories) below `dir`
pub(crate) fn collect_extracted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            Error::filesystem(
                "read directory",
                path,
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        if !entry.file_type().is_dir() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Check that nothing below `dest_path` resolves outside of it
///
/// Decoders that write directly to disk (7z, external tools) are checked
/// after the fact; symlinks pointing outside are rejected.
pub(crate) fn validate_extracted_paths(archive_path: &Path, dest_path: &Path) -> Result<()> {
    let canonical_dest = dest_path
        .canonicalize()
        .map_err(|e| Error::filesystem("canonicalize", dest_path, e))?;

    for entry in WalkDir::new(dest_path).follow_links(false).min_depth(1) {
        let entry = entry.map_err(|e| failed(archive_path, e))?;
        let canonical = match entry.path().canonicalize() {
            Ok(path) => path,
            // Dangling symlinks resolve nowhere, so they cannot escape either
            Err(_) if entry.path_is_symlink() => continue,
            Err(e) => return Err(Error::filesystem("canonicalize", entry.path(), e)),
        };
        if !canonical.starts_with(&canonical_dest) {
            return Err(Error::Extraction(ExtractionError::UnsafePath {
                archive: archive_path.to_path_buf(),
                entry: entry.path().to_path_buf(),
            }));
        }
    }
    Ok(())
}
