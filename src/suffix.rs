//! Archive suffix catalog and classification
//!
//! Classification is a plain, case-sensitive suffix match against the
//! catalog minus the configured exclusions. No content sniffing is done.

use crate::types::ArchiveFormat;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Every archive suffix recognized by the unpacker, in catalog order
pub const ARCHIVE_SUFFIXES: &[&str] = &[
    ".7z", ".cb7", ".ace", ".cba", ".adf", ".alz", ".ape", ".a", ".arc", ".arj", ".bz2", ".cab",
    ".Z", ".cpio", ".deb", ".dms", ".flac", ".gz", ".tgz", ".iso", ".lrz", ".lha", ".lzh", ".lz",
    ".lzma", ".lzo", ".rpm", ".rar", ".cbr", ".rz", ".shn", ".tar", ".cbt", ".xz", ".zip", ".jar",
    ".cbz", ".zoo",
];

/// Map a catalog suffix to the format used to decode it
pub fn format_for_suffix(suffix: &str) -> ArchiveFormat {
    match suffix {
        ".7z" | ".cb7" => ArchiveFormat::SevenZip,
        ".zip" | ".jar" | ".cbz" => ArchiveFormat::Zip,
        ".rar" | ".cbr" => ArchiveFormat::Rar,
        ".tar" | ".cbt" => ArchiveFormat::Tar,
        ".tgz" => ArchiveFormat::TarGz,
        ".gz" => ArchiveFormat::Gzip,
        ".bz2" => ArchiveFormat::Bzip2,
        ".xz" => ArchiveFormat::Xz,
        ".lzma" => ArchiveFormat::Lzma,
        _ => ArchiveFormat::Other,
    }
}

/// Detect the archive format of a path from the full catalog
///
/// Exclusions are not consulted: an excluded archive is still decodable,
/// it is just not treated as an archive by the unpacker.
pub fn detect_archive_format(path: &Path) -> Option<ArchiveFormat> {
    let name = path.file_name()?.to_str()?;
    ARCHIVE_SUFFIXES
        .iter()
        .find(|suffix| name.ends_with(**suffix))
        .map(|suffix| format_for_suffix(suffix))
}

/// Active archive suffixes: the catalog narrowed by an exclusion set
#[derive(Clone, Debug, Default)]
pub struct SuffixRegistry {
    exclusions: BTreeSet<String>,
}

impl SuffixRegistry {
    /// Create a registry with the given exclusions
    pub fn new<I, S>(exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        registry.add_exclusions(exclusions);
        registry
    }

    /// Add suffixes to the exclusion set
    ///
    /// This is a set union: repeated calls accumulate. Suffixes that are not
    /// in the catalog are ignored, so exclusions can only narrow the catalog.
    pub fn add_exclusions<I, S>(&mut self, exclusions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for suffix in exclusions {
            let suffix = suffix.into();
            if ARCHIVE_SUFFIXES.contains(&suffix.as_str()) {
                self.exclusions.insert(suffix);
            } else {
                debug!(suffix, "ignoring exclusion that is not a known archive suffix");
            }
        }
    }

    /// Remove every exclusion
    pub fn clear_exclusions(&mut self) {
        self.exclusions.clear();
    }

    /// Current exclusion set
    pub fn exclusions(&self) -> &BTreeSet<String> {
        &self.exclusions
    }

    /// Catalog suffixes that are not excluded, in catalog order
    pub fn relative_suffixes(&self) -> Vec<&'static str> {
        ARCHIVE_SUFFIXES
            .iter()
            .copied()
            .filter(|suffix| !self.exclusions.contains(*suffix))
            .collect()
    }

    /// Whether `file_name` ends with an active archive suffix
    pub fn is_archive(&self, file_name: &str) -> bool {
        self.matching_suffix(file_name).is_some()
    }

    /// Whether the final component of `path` ends with an active archive suffix
    pub fn is_archive_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.is_archive(name))
    }

    /// The first active suffix `file_name` ends with
    pub fn matching_suffix(&self, file_name: &str) -> Option<&'static str> {
        ARCHIVE_SUFFIXES
            .iter()
            .copied()
            .filter(|suffix| !self.exclusions.contains(*suffix))
            .find(|suffix| file_name.ends_with(suffix))
    }
}
