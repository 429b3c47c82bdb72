//! Unpack directory naming
//!
//! An archive `<base>.<suffix>` is unpacked into the sibling directory
//! `<base>.unpack-<suffix>`. Only the last dot-separated segment counts as
//! the suffix, so `a.tar.gz` becomes `a.tar.unpack-gz`.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Directory name for an archive's basename
///
/// A name without any dot yields an empty base and the whole name as the
/// suffix (`README` becomes `.unpack-README`), mirroring a split on `.`.
pub fn unpack_dir_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((base, suffix)) => format!("{base}.unpack-{suffix}"),
        None => format!(".unpack-{file_name}"),
    }
}

/// Absolute unpack directory for an archive path
///
/// Relative paths are resolved against the current working directory so the
/// result stays stable while the recursive walk moves between directories.
pub fn unpack_dir_for(archive_path: &Path) -> Result<PathBuf> {
    let absolute = absolute_path(archive_path)?;
    let file_name = absolute
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::config(
                format!("archive path {} has no valid file name", archive_path.display()),
                "archive",
            )
        })?;
    let parent = absolute.parent().unwrap_or_else(|| Path::new("/"));
    Ok(parent.join(unpack_dir_name(file_name)))
}

/// Resolve a path against the current directory without touching symlinks
pub(crate) fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| Error::filesystem("resolve", path, e))
}
