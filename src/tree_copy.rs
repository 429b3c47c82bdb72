//! Directory-level drivers built on [`Unpacker`]
//!
//! - [`copy_tree`] mirrors a whole input tree into an output tree, replacing
//!   every archive with the directory it unpacks to
//! - [`unpack_all`] unpacks the archives sitting directly in one directory

use crate::config::CopyConfig;
use crate::error::{Error, Result};
use crate::naming::absolute_path;
use crate::types::{ArchiveOutcome, FailureKind, OutcomeStatus, UnpackReport};
use crate::unpacker::Unpacker;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Compile filename exclusion patterns, anchored at the start of the name
fn compile_exclusions(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| Regex::new(&format!("^(?:{pattern})")).map_err(Error::from))
        .collect()
}

fn is_excluded(file_name: &str, exclusions: &[Regex]) -> bool {
    exclusions.iter().any(|re| re.is_match(file_name))
}

fn require_directory(dir: &Path, key: &str) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(Error::config(
            format!("{} does not exist or is not a directory", dir.display()),
            key,
        ))
    }
}

/// Mirror `input_dir` into `output_dir`, unpacking archives along the way
///
/// Every regular file below `input_dir` whose bare name does not match one of
/// `config.file_exclusions` is mirrored at the same relative path. Plain
/// files are copied with their permission bits. An archive is unpacked with
/// `unpacker` into a directory at its mirrored path, so `docs/a.zip` becomes
/// the directory `docs/a.zip/` holding `a.unpack-zip/`.
///
/// The input tree is listed before anything is written, and entries that lie
/// inside `output_dir` are skipped, so an output tree nested in the input
/// tree is never copied into itself.
///
/// # Errors
///
/// A missing input directory or an invalid pattern is reported before any
/// work starts. A failed copy (or an archive that cannot be staged) aborts
/// the walk unless `config.skip_copy_errors` is set, in which case it is
/// logged and recorded as a [`FailureKind::Filesystem`] outcome. Failures
/// inside an archive never abort the walk; they are in the returned report.
pub fn copy_tree(
    unpacker: &Unpacker,
    input_dir: &Path,
    output_dir: &Path,
    config: &CopyConfig,
) -> Result<UnpackReport> {
    require_directory(input_dir, "input_directory")?;
    let exclusions = compile_exclusions(&config.file_exclusions)?;

    let input_dir = absolute_path(input_dir)?;
    let output_dir = absolute_path(output_dir)?;
    std::fs::create_dir_all(&output_dir)
        .map_err(|e| Error::filesystem("create directory", &output_dir, e))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&input_dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(&input_dir).to_path_buf();
            Error::filesystem(
                "read directory",
                path,
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
            )
        })?;
        if entry.file_type().is_file() && !entry.path().starts_with(&output_dir) {
            files.push(entry.into_path());
        }
    }

    info!(?input_dir, ?output_dir, files = files.len(), "copying tree");

    let mut report = UnpackReport::default();
    for source in files {
        let Some(file_name) = source.file_name().and_then(|n| n.to_str()) else {
            debug!(?source, "skipping file with non-UTF-8 name");
            continue;
        };
        if is_excluded(file_name, &exclusions) {
            debug!(?source, "excluded by pattern");
            continue;
        }

        let relative = source
            .strip_prefix(&input_dir)
            .map_err(|_| Error::Other(format!("{} escaped the input tree", source.display())))?;
        let destination = output_dir.join(relative);

        match copy_or_unpack(unpacker, &source, &destination) {
            Ok(file_report) => report.merge(file_report),
            Err(e) if config.skip_copy_errors => {
                error!(?source, ?destination, error = %e, "copy failed, skipping");
                report.outcomes.push(ArchiveOutcome {
                    archive: source.clone(),
                    depth: 0,
                    status: OutcomeStatus::Failed {
                        kind: FailureKind::Filesystem,
                        reason: e.to_string(),
                    },
                });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        ?output_dir,
        extracted = report.extracted().count(),
        failed = report.failures().count(),
        "tree copy complete"
    );
    Ok(report)
}

/// Unpack `source` into the directory `destination`, or copy it there as a file
fn copy_or_unpack(
    unpacker: &Unpacker,
    source: &Path,
    destination: &Path,
) -> Result<UnpackReport> {
    if unpacker.registry().is_archive_path(source) {
        debug!(?source, ?destination, "unpacking file");
        return unpacker.unpack(source, destination);
    }

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::filesystem("create directory", parent, e))?;
    }
    debug!(?source, ?destination, "copying file");
    // fs::copy carries the permission bits over
    std::fs::copy(source, destination)
        .map_err(|e| Error::filesystem("copy file to", destination, e))?;
    Ok(UnpackReport::default())
}

/// Unpack every archive directly inside `input_dir` into `output_dir`
///
/// Subdirectories are not entered. Archives are processed suffix by suffix
/// in catalog order, and by file name within one suffix.
pub fn unpack_all(
    unpacker: &Unpacker,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<UnpackReport> {
    require_directory(input_dir, "input_directory")?;

    let mut files: Vec<PathBuf> = Vec::new();
    let entries = std::fs::read_dir(input_dir)
        .map_err(|e| Error::filesystem("read directory", input_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::filesystem("read directory", input_dir, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| Error::filesystem("stat", entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut report = UnpackReport::default();
    let mut handled = HashSet::new();
    for suffix in unpacker.relative_suffixes() {
        for file in &files {
            let matches = file
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.ends_with(suffix));
            if matches && handled.insert(file.clone()) {
                report.merge(unpacker.unpack(file, output_dir)?);
            }
        }
    }

    info!(
        ?input_dir,
        archives = handled.len(),
        failed = report.failures().count(),
        "unpacked directory"
    );
    Ok(report)
}
