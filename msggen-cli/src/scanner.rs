//! Discovery of receiver model documents.
//!
//! Recursively finds `*.messages.json` files under a root, respecting
//! `.gitignore` patterns and an optional glob filter.

use crate::error::{CliError, CliResult, ScanError};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Suffix every model document carries.
pub const MODEL_SUFFIX: &str = ".messages.json";

/// A discovered model document with its content.
#[derive(Debug, Clone)]
pub struct ModelFile {
    /// Absolute path to the file.
    pub path: PathBuf,

    /// Path relative to the scan root.
    pub relative_path: PathBuf,

    /// File content.
    pub content: String,
}

/// Whether `path` names a model document.
pub fn is_model_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.len() > MODEL_SUFFIX.len() && name.ends_with(MODEL_SUFFIX))
}

/// Scanner for model documents.
#[derive(Debug)]
pub struct ModelScanner {
    /// Root directory to scan.
    root: PathBuf,

    /// Optional glob filter pattern.
    filter: Option<glob::Pattern>,
}

impl ModelScanner {
    /// Create a new scanner for the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            filter: None,
        }
    }

    /// Only include files whose path relative to the root matches `pattern`.
    pub fn with_filter(mut self, pattern: &str) -> Result<Self, ScanError> {
        let glob_pattern = glob::Pattern::new(pattern)
            .map_err(|e| ScanError::invalid_pattern(pattern, e.to_string()))?;
        self.filter = Some(glob_pattern);
        Ok(self)
    }

    /// Scan the directory and return every model document, sorted by path.
    pub fn scan(&self) -> CliResult<Vec<ModelFile>> {
        if !self.root.exists() {
            return Err(ScanError::not_found(self.root.clone()).into());
        }

        let mut files = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .hidden(false)
            .build();

        for entry in walker {
            let entry = entry.map_err(ScanError::Walk)?;
            let path = entry.path();

            if !path.is_file() || !is_model_file(path) {
                continue;
            }

            let relative = self.relative_path(path);
            if let Some(ref pattern) = self.filter {
                if !pattern.matches_path(&relative) {
                    continue;
                }
            }

            let content = std::fs::read_to_string(path).map_err(|e| ScanError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

            files.push(ModelFile {
                path: path.to_path_buf(),
                relative_path: relative,
                content,
            });
        }

        if files.is_empty() {
            return Err(ScanError::no_model_files(self.root.clone()).into());
        }

        // Registry numbering follows receiver order.
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    /// Scan without failing on empty results.
    pub fn scan_allow_empty(&self) -> CliResult<Vec<ModelFile>> {
        match self.scan() {
            Ok(files) => Ok(files),
            Err(CliError::Scan(ScanError::NoModelFiles { .. })) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
