use crate::error::{Error, Result};
use crate::types::ArchiveFormat;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::shared::{ensure_dest, failed};

/// Decompressor for single-stream formats (.gz, .bz2, .xz, .lzma)
///
/// The stream is written to a file named after the archive without its last
/// suffix: `notes.txt.gz` becomes `notes.txt`, `data.tar.gz` becomes
/// `data.tar` (which the recursive walk then unpacks in turn).
pub struct StreamExtractor;

impl StreamExtractor {
    /// Name of the decompressed output file for an archive
    pub fn output_name(archive_path: &Path) -> String {
        archive_path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty() && !s.starts_with('.'))
            .unwrap_or("data")
            .to_string()
    }

    fn decoder(
        archive_path: &Path,
        format: ArchiveFormat,
        file: File,
    ) -> Result<Box<dyn Read>> {
        let reader = BufReader::new(file);
        let decoder: Box<dyn Read> = match format {
            ArchiveFormat::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            ArchiveFormat::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            ArchiveFormat::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
            ArchiveFormat::Lzma => {
                let stream = xz2::stream::Stream::new_lzma_decoder(u64::MAX).map_err(|e| {
                    failed(archive_path, format!("failed to initialise lzma decoder: {e}"))
                })?;
                Box::new(xz2::read::XzDecoder::new_stream(reader, stream))
            }
            other => {
                return Err(failed(
                    archive_path,
                    format!("{other:?} is not a single-stream format"),
                ));
            }
        };
        Ok(decoder)
    }

    /// Decompress `archive_path` into `dest_path`
    pub fn try_extract(
        archive_path: &Path,
        dest_path: &Path,
        format: ArchiveFormat,
    ) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, ?format, "attempting stream decompression");

        ensure_dest(dest_path)?;

        let file =
            File::open(archive_path).map_err(|e| Error::filesystem("open", archive_path, e))?;
        let mut decoder = Self::decoder(archive_path, format, file)?;

        let output_path = dest_path.join(Self::output_name(archive_path));
        let mut output = File::create(&output_path)
            .map_err(|e| Error::filesystem("create file", &output_path, e))?;

        if let Err(e) = std::io::copy(&mut decoder, &mut output) {
            drop(output);
            // A half-written output would be mistaken for real content
            std::fs::remove_file(&output_path).ok();
            return Err(failed(
                archive_path,
                format!("failed to decompress {format:?} stream: {e}"),
            ));
        }

        info!(?archive_path, ?output_path, "stream decompression successful");

        Ok(vec![output_path])
    }
}
