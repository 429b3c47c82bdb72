//! Core types: archive formats and per-run reports

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Archive format, detected from the filename suffix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// 7-Zip archive (.7z, .cb7)
    SevenZip,
    /// ZIP archive (.zip, .jar, .cbz)
    Zip,
    /// RAR archive (.rar, .cbr)
    Rar,
    /// Uncompressed tarball (.tar, .cbt)
    Tar,
    /// Gzip-compressed tarball (.tgz)
    TarGz,
    /// Single gzip stream (.gz)
    Gzip,
    /// Single bzip2 stream (.bz2)
    Bzip2,
    /// Single xz stream (.xz)
    Xz,
    /// Single legacy lzma stream (.lzma)
    Lzma,
    /// Any other catalog format, handled by an external tool
    Other,
}

impl ArchiveFormat {
    /// Whether the format is a single compressed stream rather than a container
    pub fn is_single_stream(self) -> bool {
        matches!(
            self,
            ArchiveFormat::Gzip | ArchiveFormat::Bzip2 | ArchiveFormat::Xz | ArchiveFormat::Lzma
        )
    }
}

/// Why an archive could not be processed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The decoder rejected the archive (corrupt, unsupported, encrypted)
    Extraction,
    /// A filesystem operation around the extraction failed
    Filesystem,
}

/// What happened to a single archive (or copied file) during a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Extracted into `unpack_dir`
    Extracted {
        /// Directory holding the archive's contents
        unpack_dir: PathBuf,
    },
    /// Processing failed; the archive was left in place
    Failed {
        /// Failure class
        kind: FailureKind,
        /// Human-readable reason
        reason: String,
    },
    /// Nested deeper than the configured maximum; left in place
    DepthLimitReached,
}

/// Outcome for one archive
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveOutcome {
    /// Absolute path of the archive
    pub archive: PathBuf,
    /// Nesting depth (0 for the archive passed to `unpack`)
    pub depth: u32,
    /// Result of processing
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Report for an `unpack`, `copy_tree` or `unpack_all` run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpackReport {
    /// One entry per archive processed, in processing order
    pub outcomes: Vec<ArchiveOutcome>,
    /// Leftover archive files deleted by the cleanup pass
    pub cleaned: Vec<PathBuf>,
}

impl UnpackReport {
    /// Archives that were extracted
    pub fn extracted(&self) -> impl Iterator<Item = &ArchiveOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Extracted { .. }))
    }

    /// Archives that failed or hit the depth limit
    pub fn failures(&self) -> impl Iterator<Item = &ArchiveOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, OutcomeStatus::Extracted { .. }))
    }

    /// Whether any archive failed or hit the depth limit
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Append another report's outcomes and cleaned files
    pub fn merge(&mut self, other: UnpackReport) {
        self.outcomes.extend(other.outcomes);
        self.cleaned.extend(other.cleaned);
    }
}
