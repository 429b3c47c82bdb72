use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::shared::{ensure_dest, failed, sanitize_entry_path};

/// Compression wrapped around a tarball
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TarCompression {
    /// Plain tar
    None,
    /// Gzip-compressed tar (.tgz)
    Gzip,
}

/// Archive extractor for tarballs (.tar, .cbt, .tgz)
pub struct TarExtractor;

impl TarExtractor {
    /// Extract a tarball into `dest_path`
    pub fn try_extract(
        archive_path: &Path,
        dest_path: &Path,
        compression: TarCompression,
    ) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, ?compression, "attempting tar extraction");

        ensure_dest(dest_path)?;

        let file =
            File::open(archive_path).map_err(|e| Error::filesystem("open", archive_path, e))?;
        let reader: Box<dyn Read> = match compression {
            TarCompression::None => Box::new(BufReader::new(file)),
            TarCompression::Gzip => Box::new(GzDecoder::new(BufReader::new(file))),
        };

        let mut archive = tar::Archive::new(reader);
        let entries = archive
            .entries()
            .map_err(|e| failed(archive_path, format!("failed to read tar archive: {e}")))?;

        let mut extracted_files = Vec::new();
        for entry in entries {
            let mut entry = entry
                .map_err(|e| failed(archive_path, format!("failed to read tar entry: {e}")))?;
            let entry_path = entry
                .path()
                .map_err(|e| failed(archive_path, format!("invalid tar entry path: {e}")))?
                .into_owned();

            // unpack_in refuses entries that would land outside dest_path
            let unpacked = entry.unpack_in(dest_path).map_err(|e| {
                failed(
                    archive_path,
                    format!("failed to unpack {}: {e}", entry_path.display()),
                )
            })?;
            if !unpacked {
                warn!(?archive_path, entry = ?entry_path, "skipping entry with unsafe path");
                continue;
            }

            if entry.header().entry_type().is_file()
                && let Some(sanitized) = sanitize_entry_path(&entry_path)
            {
                extracted_files.push(dest_path.join(sanitized));
            }
        }

        info!(
            ?archive_path,
            extracted_count = extracted_files.len(),
            "tar extraction successful"
        );

        Ok(extracted_files)
    }
}
