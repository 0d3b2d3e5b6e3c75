//! Writes generated artifacts to disk.
//!
//! Supports a dry-run mode and checking whether files on disk are current.

use crate::error::{CliResult, WriteError};
use msggen::GeneratedOutput;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of a write operation.
#[derive(Debug)]
pub enum WriteResult {
    /// File was written successfully.
    Written {
        /// Path to the written file.
        path: PathBuf,
        /// Number of bytes written.
        bytes: usize,
    },
    /// File already had the generated content.
    Unchanged { path: PathBuf },
    /// Dry run - content was not written.
    DryRun {
        /// Content that would have been written.
        content: String,
        /// Path where content would have been written.
        path: PathBuf,
    },
}

/// File writer with dry-run support.
#[derive(Debug)]
pub struct FileWriter {
    dry_run: bool,
}

impl FileWriter {
    /// Create a new file writer.
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Write content to a file.
    ///
    /// In dry-run mode, returns the content without writing. Files whose
    /// content already matches are left untouched.
    pub fn write(&self, path: &Path, content: &str) -> CliResult<WriteResult> {
        if self.dry_run {
            return Ok(WriteResult::DryRun {
                content: content.to_string(),
                path: path.to_path_buf(),
            });
        }

        if std::fs::read_to_string(path).is_ok_and(|existing| existing == content) {
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| WriteError::CreateDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        std::fs::write(path, content).map_err(|e| WriteError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(WriteResult::Written {
            path: path.to_path_buf(),
            bytes: content.len(),
        })
    }

    /// Write every generated file into `dir`.
    pub fn write_all(&self, dir: &Path, output: &GeneratedOutput) -> CliResult<Vec<WriteResult>> {
        output
            .files
            .iter()
            .map(|file| {
                let result = self.write(&dir.join(&file.file_name), &file.content)?;
                debug!(path = %result.path().display(), written = result.was_written(), "output file");
                Ok(result)
            })
            .collect()
    }
}

/// Paths under `dir` that are missing or differ from `output`.
pub fn stale_files(dir: &Path, output: &GeneratedOutput) -> Vec<PathBuf> {
    output
        .files
        .iter()
        .filter_map(|file| {
            let path = dir.join(&file.file_name);
            let current = std::fs::read_to_string(&path).is_ok_and(|existing| existing == file.content);
            (!current).then_some(path)
        })
        .collect()
}

impl WriteResult {
    /// Get the path associated with this result.
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path, .. } => path,
            WriteResult::Unchanged { path } => path,
            WriteResult::DryRun { path, .. } => path,
        }
    }

    /// Check if the file was written in this run.
    pub fn was_written(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }

    /// Get the number of bytes written (0 unless written).
    pub fn bytes(&self) -> usize {
        match self {
            WriteResult::Written { bytes, .. } => *bytes,
            WriteResult::Unchanged { .. } | WriteResult::DryRun { .. } => 0,
        }
    }
}
