//! # recursive-unpack
//!
//! Recursively discover and extract nested archives.
//!
//! Given an archive, [`Unpacker`] copies it into an output directory,
//! extracts it into a sibling directory named `<base>.unpack-<suffix>`,
//! deletes the archive, and keeps going with every archive the extraction
//! exposed until none are left. The naming keeps provenance visible: the
//! directory `photos.unpack-zip` came from `photos.zip`.
//!
//! ## Design
//!
//! - **Failure isolation** - a corrupt or unsupported archive is logged,
//!   left in place and recorded in the [`UnpackReport`]; its siblings are
//!   still unpacked
//! - **Bounded** - a visited set and a configurable maximum nesting depth
//!   stop self-reproducing archives
//! - **Pluggable decoding** - extraction goes through the
//!   [`extraction::ArchiveExtractor`] trait; the default decodes 7z, ZIP,
//!   RAR, tar and single-stream compressors natively and can fall back to a
//!   `7z` binary on `PATH`
//!
//! ## Quick Start
//!
//! ```no_run
//! use recursive_unpack::{Unpacker, UnpackerConfig};
//! use std::path::Path;
//!
//! let mut unpacker = Unpacker::new(UnpackerConfig::default());
//! unpacker.add_exclusions([".iso"]);
//!
//! let report = unpacker.unpack(Path::new("bundle.tar"), Path::new("./unpack"))?;
//! println!(
//!     "extracted {} archives, {} failed",
//!     report.extracted().count(),
//!     report.failures().count()
//! );
//! # Ok::<(), recursive_unpack::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// Unpack directory naming
pub mod naming;
/// Archive suffix catalog and exclusions
pub mod suffix;
/// Tree-copy and flat directory drivers
pub mod tree_copy;
/// Core types
pub mod types;
/// Recursive unpacker
pub mod unpacker;


pub use config::{CopyConfig, UnpackerConfig};
pub use error::{Error, ExtractionError, Result};
pub use naming::{unpack_dir_for, unpack_dir_name};
pub use suffix::{ARCHIVE_SUFFIXES, SuffixRegistry};
pub use tree_copy::{copy_tree, unpack_all};
pub use types::{ArchiveFormat, ArchiveOutcome, FailureKind, OutcomeStatus, UnpackReport};
pub use unpacker::Unpacker;
