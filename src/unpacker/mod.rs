//! Recursive archive unpacking
//!
//! [`Unpacker::unpack`] copies an archive into the output directory, extracts
//! it into a sibling `<base>.unpack-<suffix>` directory, deletes it, and then
//! rescans the archive's parent directory tree for archives the extraction
//! exposed. Each of those is handled the same way until a rescan finds
//! nothing new. A final cleanup pass removes leftover archive files.
//!
//! Failures are contained per archive: a corrupt or unsupported archive is
//! logged, recorded in the [`UnpackReport`] and left in place, and the walk
//! continues with its siblings.

mod cleanup;


use crate::config::UnpackerConfig;
use crate::error::{Error, Result};
use crate::extraction::{ArchiveExtractor, NativeExtractor};
use crate::naming::{absolute_path, unpack_dir_for};
use crate::suffix::SuffixRegistry;
use crate::types::{ArchiveOutcome, FailureKind, OutcomeStatus, UnpackReport};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{Span, debug, error, info, info_span, warn};
use walkdir::WalkDir;

/// Mutable state for one top-level `unpack` call
#[derive(Default)]
struct RunState {
    /// Absolute paths of archives already attempted in this run
    visited: HashSet<PathBuf>,
    /// Nesting depth of archives found inside each unpack directory
    unpack_depths: HashMap<PathBuf, u32>,
    report: UnpackReport,
}

impl RunState {
    fn record(&mut self, archive: &Path, depth: u32, status: OutcomeStatus) {
        self.report.outcomes.push(ArchiveOutcome {
            archive: archive.to_path_buf(),
            depth,
            status,
        });
    }

    /// Nesting depth of `candidate`, from the closest enclosing unpack directory
    ///
    /// Archives outside every unpack directory of this run sit at depth 0.
    fn nesting_depth(&self, candidate: &Path) -> u32 {
        candidate
            .ancestors()
            .skip(1)
            .find_map(|dir| self.unpack_depths.get(dir).copied())
            .unwrap_or(0)
    }
}

/// Recursive unpacker
///
/// Holds the suffix registry, the run configuration, the extraction service
/// and its own tracing span. An `Unpacker` is not meant to be shared between
/// threads that write into overlapping output directories; give each worker
/// its own instance and its own output tree.
///
/// # Example
///
/// ```no_run
/// use recursive_unpack::{Unpacker, UnpackerConfig};
/// use std::path::Path;
///
/// let unpacker = Unpacker::new(UnpackerConfig::default());
/// let report = unpacker.unpack(Path::new("bundle.tar"), Path::new("./unpack"))?;
/// for failure in report.failures() {
///     eprintln!("{} was not extracted", failure.archive.display());
/// }
/// # Ok::<(), recursive_unpack::Error>(())
/// ```
pub struct Unpacker {
    config: UnpackerConfig,
    registry: SuffixRegistry,
    extractor: Box<dyn ArchiveExtractor>,
    span: Span,
}

impl std::fmt::Debug for Unpacker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unpacker")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("extractor", &self.extractor.name())
            .finish()
    }
}

impl Unpacker {
    /// Create an unpacker using the [`NativeExtractor`]
    pub fn new(config: UnpackerConfig) -> Self {
        Self::with_extractor(config, NativeExtractor::new())
    }

    /// Create an unpacker with a custom extraction service
    pub fn with_extractor(
        config: UnpackerConfig,
        extractor: impl ArchiveExtractor + 'static,
    ) -> Self {
        let registry = SuffixRegistry::new(config.exclusions.iter().cloned());
        let span = info_span!("unpacker", name = %config.name);
        Self {
            config,
            registry,
            extractor: Box::new(extractor),
            span,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &UnpackerConfig {
        &self.config
    }

    /// Active suffix registry
    pub fn registry(&self) -> &SuffixRegistry {
        &self.registry
    }

    /// Name of the extraction service in use
    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Add suffixes to the exclusion set (set union with the current exclusions)
    pub fn add_exclusions<I, S>(&mut self, exclusions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.add_exclusions(exclusions);
        self.config.exclusions = self.registry.exclusions().clone();
    }

    /// Remove every exclusion
    pub fn clear_exclusions(&mut self) {
        self.registry.clear_exclusions();
        self.config.exclusions.clear();
    }

    /// Catalog suffixes that are not excluded, in catalog order
    pub fn relative_suffixes(&self) -> Vec<&'static str> {
        self.registry.relative_suffixes()
    }

    /// Whether `file_name` is a recognized archive
    pub fn is_archive(&self, file_name: &str) -> bool {
        self.registry.is_archive(file_name)
    }

    /// Unpack `archive` into `output_directory`, cleaning up per the configuration
    pub fn unpack(&self, archive: &Path, output_directory: &Path) -> Result<UnpackReport> {
        self.unpack_with(archive, output_directory, self.config.clean)
    }

    /// Unpack `archive` into `output_directory`
    ///
    /// `clean` gates the final cleanup pass only; per-archive deletion after a
    /// successful extraction is controlled by `delete_after_extract`.
    ///
    /// # Errors
    ///
    /// Only problems that prevent the run from starting are returned: a
    /// missing archive, an output directory that cannot be created, or an
    /// archive that cannot be copied into it. Failures of individual
    /// archives are reported in the returned [`UnpackReport`].
    pub fn unpack_with(
        &self,
        archive: &Path,
        output_directory: &Path,
        clean: bool,
    ) -> Result<UnpackReport> {
        let _guard = self.span.enter();

        if !archive.is_file() {
            return Err(Error::config(
                format!("archive {} does not exist or is not a file", archive.display()),
                "archive",
            ));
        }

        std::fs::create_dir_all(output_directory)
            .map_err(|e| Error::filesystem("create directory", output_directory, e))?;

        let output_directory = absolute_path(output_directory)?;
        let copied_archive = self.copy_into(archive, &output_directory)?;

        info!(?archive, ?output_directory, "unpacking");

        let mut state = RunState::default();
        self.unpack_recursive(&copied_archive, 0, &mut state);

        if clean {
            let keep = state
                .report
                .failures()
                .map(|o| o.archive.clone())
                .collect::<HashSet<_>>();
            state.report.cleaned = cleanup::remove_leftover_archives(
                &self.registry,
                &output_directory,
                &keep,
            );
        }

        info!(
            ?output_directory,
            extracted = state.report.extracted().count(),
            failed = state.report.failures().count(),
            cleaned = state.report.cleaned.len(),
            "unpack complete"
        );

        Ok(state.report)
    }

    /// Run the cleanup pass on its own
    ///
    /// Deletes every file below `output_directory` whose name matches an
    /// active archive suffix and returns the deleted paths.
    pub fn clean(&self, output_directory: &Path) -> Result<Vec<PathBuf>> {
        let _guard = self.span.enter();
        let output_directory = absolute_path(output_directory)?;
        Ok(cleanup::remove_leftover_archives(
            &self.registry,
            &output_directory,
            &HashSet::new(),
        ))
    }

    /// Snapshot every archive below `dir`, sorted by path
    ///
    /// The whole listing is collected before anything is extracted, so the
    /// recursion never iterates a directory it is modifying.
    pub fn discover_archives(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut archives = Vec::new();
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
            if entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| self.registry.is_archive(name))
            {
                archives.push(entry.into_path());
            }
        }
        Ok(archives)
    }

    /// Copy `archive` into `output_directory` unless it already lives there
    ///
    /// The archive counts as already in place when its destination is the
    /// same file, however the two paths are spelled (`..` segments, symlinked
    /// directories). The returned path is always spelled under
    /// `output_directory`.
    fn copy_into(&self, archive: &Path, output_directory: &Path) -> Result<PathBuf> {
        let archive = absolute_path(archive)?;
        let file_name = archive.file_name().ok_or_else(|| {
            Error::config(
                format!("archive path {} has no file name", archive.display()),
                "archive",
            )
        })?;

        let destination = output_directory.join(file_name);
        if is_same_file(&archive, &destination)? {
            debug!(?archive, ?destination, "archive already in output directory");
            return Ok(destination);
        }

        debug!(?archive, ?destination, "copying archive into output directory");
        std::fs::copy(&archive, &destination)
            .map_err(|e| Error::filesystem("copy archive to", &destination, e))?;
        Ok(destination)
    }

    /// Extract one archive, then recurse into archives its parent tree now holds
    ///
    /// `depth` is the number of archives enclosing this one, so siblings
    /// share a depth even though they are reached through nested calls.
    fn unpack_recursive(&self, archive: &Path, depth: u32, state: &mut RunState) {
        if !state.visited.insert(archive.to_path_buf()) {
            return;
        }

        debug!(?archive, depth, "unpack");

        if depth > self.config.max_depth {
            warn!(
                ?archive,
                depth,
                max_depth = self.config.max_depth,
                "maximum nesting depth reached, leaving archive in place"
            );
            state.record(archive, depth, OutcomeStatus::DepthLimitReached);
            return;
        }

        let unpack_dir = match self.extract_one(archive) {
            Ok(unpack_dir) => unpack_dir,
            Err(e) => {
                error!(archive = %archive.display(), error = %e, "unpack archive failed");
                let kind = if e.is_filesystem_failure() {
                    FailureKind::Filesystem
                } else {
                    FailureKind::Extraction
                };
                state.record(
                    archive,
                    depth,
                    OutcomeStatus::Failed {
                        kind,
                        reason: e.to_string(),
                    },
                );
                return;
            }
        };
        state.unpack_depths.insert(unpack_dir.clone(), depth + 1);
        state.record(archive, depth, OutcomeStatus::Extracted { unpack_dir });

        let Some(archive_dir) = archive.parent() else {
            return;
        };

        let candidates = match self.discover_archives(archive_dir) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(?archive_dir, error = %e, "failed to scan for nested archives");
                return;
            }
        };

        for candidate in candidates {
            if candidate == archive || state.visited.contains(&candidate) {
                continue;
            }
            // An earlier sibling's recursion may already have consumed it
            if !candidate.is_file() {
                continue;
            }
            let candidate_depth = state.nesting_depth(&candidate);
            self.unpack_recursive(&candidate, candidate_depth, state);
        }
    }

    /// Extract `archive` into its unpack directory and delete it on success
    fn extract_one(&self, archive: &Path) -> Result<PathBuf> {
        let unpack_dir = unpack_dir_for(archive)?;

        if unpack_dir.exists() {
            warn!(?unpack_dir, "unpack directory already exists, merging into it");
        }
        std::fs::create_dir_all(&unpack_dir)
            .map_err(|e| Error::filesystem("create directory", &unpack_dir, e))?;

        let files = self.extractor.extract(archive, &unpack_dir)?;
        debug!(?archive, ?unpack_dir, extracted_count = files.len(), "extracted");

        if self.config.delete_after_extract {
            debug!(?archive, "removing extracted archive");
            std::fs::remove_file(archive).map_err(|e| Error::filesystem("remove", archive, e))?;
        }

        Ok(unpack_dir)
    }
}

/// Whether `a` and `b` resolve to the same existing file
fn is_same_file(a: &Path, b: &Path) -> Result<bool> {
    if !b.exists() {
        return Ok(false);
    }
    let a = a
        .canonicalize()
        .map_err(|e| Error::filesystem("canonicalize", a, e))?;
    let b = b
        .canonicalize()
        .map_err(|e| Error::filesystem("canonicalize", b, e))?;
    Ok(a == b)
}
