//! Error types for recursive-unpack
//!
//! This module provides the error handling for the library:
//! - A top-level [`Error`] for configuration, filesystem and extraction problems
//! - A nested [`ExtractionError`] describing why a single archive could not be decoded
//! - Classification helpers so callers can tell a corrupt archive from a
//!   permissions problem without parsing messages

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for recursive-unpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for recursive-unpack
///
/// Each variant carries enough context to diagnose the problem from a log line.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "input_directory")
        key: Option<String>,
    },

    /// Archive extraction error (corrupt data, unsupported format, etc.)
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Filesystem operation failed on a specific path
    #[error("failed to {operation} {path}: {source}")]
    Filesystem {
        /// The path the operation was applied to
        path: PathBuf,
        /// Short description of the operation (e.g., "create directory")
        operation: &'static str,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error without path context
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A filename exclusion pattern is not a valid regular expression
    #[error("invalid exclusion pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Serialization error (config files, reports)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (7z, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors raised while decoding a single archive
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The decoder rejected the archive
    #[error("extraction failed for {archive}: {reason}")]
    Failed {
        /// The archive file that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// No decoder is available for the archive's format
    #[error("unsupported archive format for {archive}")]
    UnsupportedFormat {
        /// The archive that has no decoder
        archive: PathBuf,
    },

    /// The archive is encrypted and cannot be opened without a password
    #[error("archive {archive} is password protected")]
    PasswordProtected {
        /// The encrypted archive
        archive: PathBuf,
    },

    /// An entry would be written outside the unpack directory
    #[error("unsafe entry {entry} in archive {archive}")]
    UnsafePath {
        /// The archive containing the entry
        archive: PathBuf,
        /// The offending entry path
        entry: PathBuf,
    },
}

impl Error {
    /// Build a [`Error::Config`] for the given key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Wrap an I/O error with the path and operation that produced it
    pub fn filesystem(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::Filesystem {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Whether the error came from decoding an archive
    pub fn is_extraction_failure(&self) -> bool {
        matches!(self, Error::Extraction(_) | Error::ExternalTool(_))
    }

    /// Whether the error came from the filesystem rather than the archive contents
    pub fn is_filesystem_failure(&self) -> bool {
        matches!(self, Error::Filesystem { .. } | Error::Io(_))
    }

    /// Whether the error is a configuration problem that should abort the run
    pub fn is_configuration_issue(&self) -> bool {
        matches!(
            self,
            Error::Config { .. } | Error::InvalidPattern(_) | Error::Serialization(_)
        )
    }
}
