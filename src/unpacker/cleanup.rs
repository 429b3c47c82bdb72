//! Cleanup pass for leftover archive files

use crate::suffix::SuffixRegistry;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Delete every archive file below `root` except those in `keep`
///
/// Errors are logged as warnings but don't stop the sweep. Returns the
/// paths that were actually deleted.
pub(crate) fn remove_leftover_archives(
    registry: &SuffixRegistry,
    root: &Path,
    keep: &HashSet<PathBuf>,
) -> Vec<PathBuf> {
    debug!(?root, "cleaning up leftover archives");

    let files_to_delete = collect_cleanup_targets(registry, root, keep);

    let mut deleted = Vec::with_capacity(files_to_delete.len());
    for file in files_to_delete {
        match std::fs::remove_file(&file) {
            Ok(()) => {
                debug!(?file, "removed leftover archive");
                deleted.push(file);
            }
            Err(e) => {
                warn!(?file, error = %e, "failed to delete leftover archive");
            }
        }
    }

    info!(?root, deleted_files = deleted.len(), "cleanup complete");
    deleted
}

/// Collect archive files to delete, walking the whole tree first
fn collect_cleanup_targets(
    registry: &SuffixRegistry,
    root: &Path,
    keep: &HashSet<PathBuf>,
) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(?root, error = %e, "failed to read directory during cleanup");
                continue;
            }
        };

        if entry.file_type().is_file()
            && registry.is_archive_path(entry.path())
            && !keep.contains(entry.path())
        {
            targets.push(entry.into_path());
        } else if entry.file_type().is_file() && keep.contains(entry.path()) {
            debug!(path = ?entry.path(), "keeping archive that failed to unpack");
        }
    }
    targets
}
