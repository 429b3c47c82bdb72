//! Configuration types for recursive-unpack

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Unpacker configuration
///
/// Built once per run and handed to [`Unpacker::new`](crate::Unpacker::new).
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpackerConfig {
    /// Archive suffixes (with leading dot, e.g. ".zip") removed from the built-in catalog
    #[serde(default)]
    pub exclusions: BTreeSet<String>,

    /// Run the cleanup pass after the recursive extraction (default: true)
    ///
    /// The cleanup pass deletes every file under the output directory whose
    /// name still matches a recognized archive suffix.
    #[serde(default = "default_true")]
    pub clean: bool,

    /// Delete each archive right after it was extracted successfully (default: true)
    ///
    /// Independent of [`clean`](Self::clean), which only gates the final sweep.
    #[serde(default = "default_true")]
    pub delete_after_extract: bool,

    /// Maximum nesting depth of archives inside archives (default: 32)
    ///
    /// The archive passed to `unpack` is depth 0. Archives discovered deeper
    /// than this are left in place and reported as `DepthLimitReached`.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Name recorded on the unpacker's tracing span (default: "unpacker")
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for UnpackerConfig {
    fn default() -> Self {
        Self {
            exclusions: BTreeSet::new(),
            clean: true,
            delete_after_extract: true,
            max_depth: default_max_depth(),
            name: default_name(),
        }
    }
}

impl UnpackerConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::filesystem("read config", path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values that cannot work
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self.exclusions.iter().find(|s| !s.starts_with('.')) {
            return Err(Error::config(
                format!("excluded suffix {bad:?} must start with '.'"),
                "exclusions",
            ));
        }
        if self.max_depth == 0 {
            return Err(Error::config("max_depth must be at least 1", "max_depth"));
        }
        Ok(())
    }
}

/// Tree-copy configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Regular expressions matched against bare filenames, anchored at the start
    ///
    /// Files whose name matches any pattern are neither copied nor unpacked.
    #[serde(default)]
    pub file_exclusions: Vec<String>,

    /// Log and record plain-copy failures instead of aborting the walk (default: false)
    #[serde(default)]
    pub skip_copy_errors: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> u32 {
    32
}

fn default_name() -> String {
    "unpacker".to_string()
}
