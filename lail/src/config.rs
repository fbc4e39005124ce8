//! Session configuration
//!
//! Read from TOML (all keys optional) or assembled with the builder
//! setters:
//!
//! ```toml
//! base_dir = "scripts"
//! max_depth = 5000
//! bare_blocks = true
//! ```

use crate::error::{CompileError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default ceiling on nested function calls
pub const DEFAULT_MAX_DEPTH: usize = 10_000;
/// Default ceiling on nested imports
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory that relative `import` paths resolve against
    pub base_dir: PathBuf,
    /// Maximum call depth before a stack overflow error
    pub max_depth: usize,
    /// Maximum import nesting before a parse diagnostic
    pub max_import_depth: usize,
    /// Accept a single bare statement where a `{ ... }` block is expected
    pub bare_blocks: bool,
    /// Treat unbound identifiers as runtime errors instead of `null`
    pub strict_identifiers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            max_depth: DEFAULT_MAX_DEPTH,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
            bare_blocks: false,
            strict_identifiers: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CompileError::config_error(e.to_string()))
    }

    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CompileError::io_error(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    pub fn bare_blocks(mut self, enable: bool) -> Self {
        self.bare_blocks = enable;
        self
    }

    pub fn strict_identifiers(mut self, enable: bool) -> Self {
        self.strict_identifiers = enable;
        self
    }
}
