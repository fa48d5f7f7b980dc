//! Chain walk and codec settings.
//!
//! Every field has a default, so an empty or missing TOML file yields the
//! stock behavior: walk both directions, compact output.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

/// Default upper bound on the number of files visited by one chain walk.
pub const DEFAULT_MAX_FILES: usize = 1024;

fn default_true() -> bool {
    true
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

/// Settings for [`crate::load_chain`] and [`crate::JsonCodec`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainConfig {
    /// Follow `files.prev` towards earlier files.
    #[serde(default = "default_true")]
    pub load_previous: bool,

    /// Follow `files.next` towards later files.
    #[serde(default = "default_true")]
    pub load_next: bool,

    /// Maximum number of files in one walk, the starting file included.
    /// Values below 1 are treated as 1.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Write indented JSON instead of compact JSON.
    #[serde(default)]
    pub pretty_print: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            load_previous: true,
            load_next: true,
            max_files: DEFAULT_MAX_FILES,
            pretty_print: false,
        }
    }
}

impl ChainConfig {
    /// Parse settings from a TOML string.
    pub fn from_toml_str(content: &str) -> io::Result<Self> {
        toml::from_str(content).map_err(|e| {
            io::Error::new(
                ErrorKind::InvalidData,
                format!("Failed to parse chain config: {}", e),
            )
        })
    }

    /// Load settings from a TOML file, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Effective file limit, never below 1.
    #[inline]
    pub fn file_limit(&self) -> usize {
        self.max_files.max(1)
    }
}
