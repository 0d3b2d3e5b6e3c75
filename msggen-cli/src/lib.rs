//! # msggen-cli
//!
//! Library behind the `msggen` command.
//!
//! The CLI reads one `*.messages.json` document per receiver, validates them,
//! and writes every receiver's headers and dispatcher plus the shared
//! message-name registry.
//!
//! ## Architecture
//!
//! - [`config`] - `msggen.toml` loading and CLI overrides
//! - [`scanner`] - model document discovery and filtering
//! - [`loader`] - documents to validated receivers
//! - [`generator`] - the bridge to the `msggen` engine
//! - [`writer`] - file output, dry-run and staleness checks
//! - [`watcher`] - file system watching for development mode
//! - [`error`] - error types

pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod scanner;
pub mod watcher;
pub mod writer;

pub use config::{Config, ConfigManager};
pub use error::{CliError, CliResult};
pub use generator::ArtifactGenerator;
pub use loader::ModelLoader;
pub use scanner::{ModelFile, ModelScanner};
pub use watcher::FileWatcher;
pub use writer::FileWriter;
