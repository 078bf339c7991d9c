//! Storage backends for study records.
//!
//! Records are addressed by paths relative to the study root and are always
//! read and written as whole documents. [`FsStorage`] is the real backend;
//! [`MemoryStorage`] lets tests run the full pipeline without a filesystem.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Whole-document storage keyed by root-relative paths.
pub trait Storage: Send + Sync {
    /// Read a document, `None` when it does not exist.
    fn read(&self, path: &Path) -> Result<Option<String>>;

    /// Replace a document (creating parent directories as needed).
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Whether a document exists.
    fn exists(&self, path: &Path) -> bool;

    /// Root-relative paths matching a glob pattern, sorted.
    fn list(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Human-readable location of a document, for messages.
    fn describe(&self, path: &Path) -> String {
        path.display().to_string()
    }
}

// ============================================
// Filesystem
// ============================================

/// Storage rooted at a study directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        let full = self.resolve(path);
        match fs::read_to_string(&full) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write next to the target and rename so readers never see a torn file.
        let mut tmp_name = full
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = full.with_file_name(tmp_name);
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &full)?;

        tracing::debug!(path = %full.display(), bytes = contents.len(), "Wrote record");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn list(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let root = self.root.to_string_lossy();
        let full_pattern = format!("{}/{}", glob::Pattern::escape(&root), pattern);
        let entries = glob::glob(&full_pattern)
            .map_err(|e| Error::InvalidInput(format!("bad pattern '{}': {}", pattern, e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    if let Ok(relative) = path.strip_prefix(&self.root) {
                        paths.push(relative.to_path_buf());
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Unreadable path while listing records"),
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn describe(&self, path: &Path) -> String {
        self.resolve(path).display().to_string()
    }
}

// ============================================
// In-memory
// ============================================

/// In-memory storage for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.files.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<PathBuf, String>>> {
        self.files
            .lock()
            .map_err(|_| Error::InvalidInput("memory storage lock poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.lock()?.get(path).cloned())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.lock()?
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .map(|f| f.contains_key(path))
            .unwrap_or(false)
    }

    fn list(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|e| Error::InvalidInput(format!("bad pattern: {}", e)))?;
        // BTreeMap keys are already sorted.
        Ok(self
            .lock()?
            .keys()
            .filter(|p| pattern.matches_path(p))
            .cloned()
            .collect())
    }
}
