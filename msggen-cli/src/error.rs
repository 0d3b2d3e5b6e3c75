//! Error types for the CLI.

use std::path::PathBuf;
use thiserror::Error;

use msggen::{GenerateError, ModelError};

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Main error type for CLI operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Error while discovering model documents.
    #[error("Failed to scan directory: {0}")]
    Scan(#[from] ScanError),

    /// A model document could not be read or validated.
    #[error("Failed to load model: {0}")]
    Load(#[from] LoadError),

    /// Generation failed; nothing was written.
    #[error("Failed to generate sources: {0}")]
    Generate(#[from] GenerateError),

    /// Error loading configuration.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error writing output files.
    #[error("Failed to write output: {0}")]
    Write(#[from] WriteError),

    /// Error during file watching.
    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    /// Generated sources on disk differ from a fresh run.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Generic IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error while discovering model documents.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Directory does not exist.
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// No `*.messages.json` files found in directory.
    #[error("No message model files found in: {path}")]
    NoModelFiles { path: PathBuf },

    /// Invalid filter pattern.
    #[error("Invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// IO error during scanning.
    #[error("IO error scanning {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from ignore crate walker.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

/// A model document that could not be turned into a receiver.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The document is malformed or fails validation.
    #[error("{file}: {source}")]
    Model {
        file: PathBuf,
        #[source]
        source: ModelError,
    },

    /// Multiple documents failed.
    #[error("Multiple model errors:\n{}", format_errors(.0))]
    Multiple(Vec<LoadError>),
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid TOML syntax.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// IO error reading config.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error writing output files.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to create directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("Failed to write file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error during file watching.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Failed to initialize watcher.
    #[error("Failed to initialize file watcher: {0}")]
    Init(String),

    /// Error from notify crate.
    #[error("Watch notification error: {0}")]
    Notify(String),
}

fn format_errors(errors: &[LoadError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}. {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl LoadError {
    pub fn model(file: impl Into<PathBuf>, source: ModelError) -> Self {
        Self::Model {
            file: file.into(),
            source,
        }
    }
}

impl ScanError {
    /// Create a directory not found error.
    pub fn not_found(path: PathBuf) -> Self {
        Self::DirectoryNotFound { path }
    }

    pub fn no_model_files(path: PathBuf) -> Self {
        Self::NoModelFiles { path }
    }

    /// Create an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// Create an invalid TOML error.
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_load_errors_are_numbered() {
        let first = ModelError::empty_name("message", "receiver 'Foo'");
        let second = ModelError::unknown_attribute("receiver 'Bar'", "Bogus");
        let error = LoadError::Multiple(vec![
            LoadError::model("a.messages.json", first),
            LoadError::model("b.messages.json", second),
        ]);

        let text = error.to_string();
        assert!(text.starts_with("Multiple model errors:\n  1. a.messages.json: "));
        assert!(text.contains("\n  2. b.messages.json: unknown attribute 'Bogus'"));
    }

    #[test]
    fn test_generate_error_converts() {
        let error: CliError = GenerateError::unknown_template("Frob<int>").into();
        assert_eq!(
            error.to_string(),
            "Failed to generate sources: no class template type is defined for 'Frob<int>'"
        );
    }
}
