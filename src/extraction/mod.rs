//! Archive extraction service
//!
//! The unpacker only needs one capability: "decode this archive into that
//! directory, or fail". [`ArchiveExtractor`] is that seam. [`NativeExtractor`]
//! is the default implementation; it decodes zip, 7z, rar, tar and the
//! single-stream compressors in-process and hands the rest of the catalog to
//! an external 7-Zip binary when one is installed.

mod external;
mod rar;
mod sevenz;
mod shared;
mod stream;
mod tar;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

// Re-exports
pub use external::{ExternalExtractor, SEVEN_ZIP_BINARIES};
pub use rar::RarExtractor;
pub use sevenz::SevenZipExtractor;
pub use stream::StreamExtractor;
pub use tar::{TarCompression, TarExtractor};
pub use zip::ZipExtractor;

use crate::error::{Error, ExtractionError, Result};
use crate::suffix::detect_archive_format;
use crate::types::ArchiveFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Trait for archive decoding
///
/// Implementations extract every entry of `archive_path` below `dest_path`
/// (which may already exist and contain files) and return the files written.
/// They must not delete the archive; that is the unpacker's job.
///
/// # Examples
///
/// ```no_run
/// use recursive_unpack::extraction::{ArchiveExtractor, NativeExtractor};
/// use std::path::Path;
///
/// let extractor = NativeExtractor::new();
/// let files = extractor.extract(Path::new("bundle.zip"), Path::new("bundle.unpack-zip"))?;
/// println!("extracted {} files", files.len());
/// # Ok::<(), recursive_unpack::Error>(())
/// ```
pub trait ArchiveExtractor: Send + Sync {
    /// Extract `archive_path` into `dest_path`
    ///
    /// # Errors
    ///
    /// - [`Error::Extraction`] when the archive is corrupt, encrypted,
    ///   unsupported, or contains unsafe paths
    /// - [`Error::Filesystem`] when the destination cannot be written
    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>>;

    /// Whether this extractor can decode `format`
    fn supports(&self, format: ArchiveFormat) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Default extractor: native decoders plus an optional external fallback
#[derive(Debug, Clone, Default)]
pub struct NativeExtractor {
    external: Option<ExternalExtractor>,
}

impl NativeExtractor {
    /// Create an extractor, probing `PATH` for a 7-Zip binary
    pub fn new() -> Self {
        let external = ExternalExtractor::from_path();
        match &external {
            Some(ext) => debug!(binary = ?ext.binary_path(), "external extractor available"),
            None => debug!("no external extractor found, uncommon formats are unsupported"),
        }
        Self { external }
    }

    /// Create an extractor that only uses in-process decoders
    pub fn native_only() -> Self {
        Self { external: None }
    }

    /// Create an extractor with an explicit external fallback
    pub fn with_external(external: ExternalExtractor) -> Self {
        Self {
            external: Some(external),
        }
    }
}

impl ArchiveExtractor for NativeExtractor {
    fn extract(&self, archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        let format = detect_archive_format(archive_path).ok_or_else(|| {
            Error::Extraction(ExtractionError::UnsupportedFormat {
                archive: archive_path.to_path_buf(),
            })
        })?;

        info!(?archive_path, ?format, "dispatching extraction");

        match format {
            ArchiveFormat::Zip => ZipExtractor::try_extract(archive_path, dest_path),
            ArchiveFormat::SevenZip => SevenZipExtractor::try_extract(archive_path, dest_path),
            ArchiveFormat::Rar => RarExtractor::try_extract(archive_path, dest_path),
            ArchiveFormat::Tar => {
                TarExtractor::try_extract(archive_path, dest_path, TarCompression::None)
            }
            ArchiveFormat::TarGz => {
                TarExtractor::try_extract(archive_path, dest_path, TarCompression::Gzip)
            }
            ArchiveFormat::Gzip
            | ArchiveFormat::Bzip2
            | ArchiveFormat::Xz
            | ArchiveFormat::Lzma => StreamExtractor::try_extract(archive_path, dest_path, format),
            ArchiveFormat::Other => match &self.external {
                Some(external) => external.try_extract(archive_path, dest_path),
                None => Err(Error::Extraction(ExtractionError::UnsupportedFormat {
                    archive: archive_path.to_path_buf(),
                })),
            },
        }
    }

    fn supports(&self, format: ArchiveFormat) -> bool {
        format != ArchiveFormat::Other || self.external.is_some()
    }

    fn name(&self) -> &'static str {
        if self.external.is_some() {
            "native+7z"
        } else {
            "native"
        }
    }
}
