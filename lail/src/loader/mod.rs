//! Import source loading
//!
//! The parser asks a [`SourceLoader`] for the text behind `import "path"`.
//! Resolution policy (local disk first, network as fallback) lives here,
//! outside the parser, and is injected by the caller.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Source text returned by a loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub text: String,
    /// Directory that imports nested inside `text` resolve against
    pub base: PathBuf,
    /// Stable identity of the resolved source (used for cycle detection)
    pub origin: String,
}

/// Import resolution failure
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to fetch {url}: {message}")]
    Network { url: String, message: String },
}

impl LoadError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }
}

/// Fetches source text for an import path
pub trait SourceLoader {
    fn load(&self, path: &str, base: &Path) -> Result<Loaded, LoadError>;
}

/// Reads imports from the local filesystem, relative to the importing file
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl SourceLoader for FileLoader {
    fn load(&self, path: &str, base: &Path) -> Result<Loaded, LoadError> {
        let full = base.join(path);
        let text = std::fs::read_to_string(&full).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LoadError::not_found(full.display().to_string())
            } else {
                LoadError::Io {
                    path: full.display().to_string(),
                    source,
                }
            }
        })?;
        let origin = std::fs::canonicalize(&full).unwrap_or_else(|_| full.clone());
        let base = full.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Loaded {
            text,
            base,
            origin: origin.display().to_string(),
        })
    }
}

/// Serves imports from an in-memory table keyed by the literal path
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(path.into(), text.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &str, base: &Path) -> Result<Loaded, LoadError> {
        let text = self.files.get(path).ok_or_else(|| LoadError::not_found(path))?;
        Ok(Loaded {
            text: text.clone(),
            base: base.to_path_buf(),
            origin: path.to_string(),
        })
    }
}

/// Rejects every import
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImports;

impl SourceLoader for NoImports {
    fn load(&self, path: &str, _base: &Path) -> Result<Loaded, LoadError> {
        Err(LoadError::not_found(path))
    }
}

/// Tries each loader in order; the first success wins
#[derive(Default)]
pub struct ChainLoader {
    loaders: Vec<Box<dyn SourceLoader>>,
}

impl ChainLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }
}

impl SourceLoader for ChainLoader {
    fn load(&self, path: &str, base: &Path) -> Result<Loaded, LoadError> {
        let mut last = LoadError::not_found(path);
        for loader in &self.loaders {
            match loader.load(path, base) {
                Ok(loaded) => return Ok(loaded),
                Err(err) => {
                    tracing::trace!(path, error = %err, "loader miss");
                    last = err;
                }
            }
        }
        Err(last)
    }
}

/// Fetches `http://` / `https://` imports with a blocking client
#[cfg(feature = "net")]
#[derive(Debug, Default, Clone)]
pub struct HttpLoader {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "net")]
impl HttpLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "net")]
impl SourceLoader for HttpLoader {
    fn load(&self, path: &str, base: &Path) -> Result<Loaded, LoadError> {
        if !(path.starts_with("http://") || path.starts_with("https://")) {
            return Err(LoadError::not_found(path));
        }
        let network = |e: reqwest::Error| LoadError::Network {
            url: path.to_string(),
            message: e.to_string(),
        };
        let text = self
            .client
            .get(path)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(network)?;
        Ok(Loaded {
            text,
            base: base.to_path_buf(),
            origin: path.to_string(),
        })
    }
}

/// Local disk first, then the network when the `net` feature is enabled
pub fn default_loader() -> Box<dyn SourceLoader> {
    #[cfg(feature = "net")]
    {
        Box::new(ChainLoader::new().then(FileLoader).then(HttpLoader::new()))
    }
    #[cfg(not(feature = "net"))]
    {
        Box::new(FileLoader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader_hit_and_miss() {
        let loader = MemoryLoader::new().with_file("a.lail", "let a = 1;");
        let loaded = loader.load("a.lail", Path::new(".")).unwrap();
        assert_eq!(loaded.text, "let a = 1;");
        assert_eq!(loaded.origin, "a.lail");
        assert!(matches!(
            loader.load("b.lail", Path::new(".")),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_no_imports() {
        assert!(NoImports.load("x", Path::new(".")).is_err());
    }

    #[test]
    fn test_chain_loader_falls_through() {
        let chain = ChainLoader::new()
            .then(NoImports)
            .then(MemoryLoader::new().with_file("x", "1"));
        assert_eq!(chain.load("x", Path::new(".")).unwrap().text, "1");
        assert!(chain.load("y", Path::new(".")).is_err());
    }

    #[test]
    fn test_file_loader_missing_file() {
        let err = FileLoader.load("nope.lail", Path::new("/nonexistent-dir")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_file_loader_reads_relative_to_base() {
        let dir = std::env::temp_dir().join(format!("lail-loader-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub").join("m.lail"), "let m = 2;").unwrap();

        let loaded = FileLoader.load("sub/m.lail", &dir).unwrap();
        assert_eq!(loaded.text, "let m = 2;");
        assert_eq!(loaded.base, dir.join("sub"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
