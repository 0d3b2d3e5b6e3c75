//! Configuration management for the CLI.
//!
//! This module handles loading configuration from `msggen.toml` files
//! and merging with command-line arguments.

use crate::error::{CliResult, ConfigError};
use msggen::{GeneratorConfig, IndentStyle, LineEnding, TypeTableExtension};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "msggen.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where model documents are read from.
    pub input: InputConfig,

    /// Where generated sources go.
    pub output: OutputConfig,

    /// Shape of the generated code.
    pub codegen: CodegenConfig,

    /// Additions to the built-in type table.
    pub types: TypeTableExtension,
}

/// Input configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory scanned for `*.messages.json` documents.
    pub dir: PathBuf,

    /// Optional glob over paths relative to `dir`.
    pub filter: Option<String>,
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory for generated files.
    pub dir: PathBuf,

    /// Text written at the top of every generated file.
    pub license_header: Option<String>,
}

/// Code generation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Namespace of the receiver classes.
    pub namespace: String,

    pub indent: IndentStyle,

    pub line_ending: LineEnding,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            filter: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./generated"),
            license_header: None,
        }
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        let defaults = GeneratorConfig::default();
        Self {
            namespace: defaults.application_namespace,
            indent: defaults.indent,
            line_ending: defaults.line_ending,
        }
    }
}

impl Config {
    /// The generator options this configuration describes.
    pub fn generator_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::default()
            .with_application_namespace(self.codegen.namespace.clone())
            .with_indent(self.codegen.indent)
            .with_line_ending(self.codegen.line_ending);
        if let Some(header) = &self.output.license_header {
            config = config.with_license_header(header.clone());
        }
        config
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// If the path is None, attempts to load from the default location.
    /// If no config file exists, returns default configuration.
    pub fn load(path: Option<&Path>) -> CliResult<Config> {
        let config_path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

        if !config_path.exists() {
            if path.is_some() {
                return Err(ConfigError::NotFound { path: config_path }.into());
            }
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::invalid_toml(config_path, e.to_string()))?;

        if config.codegen.namespace.trim().is_empty() {
            return Err(
                ConfigError::invalid_value("codegen.namespace", "must not be empty").into(),
            );
        }

        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref input) = args.input {
            config.input.dir = input.clone();
        }

        if let Some(ref output) = args.output {
            config.output.dir = output.clone();
        }

        if let Some(ref filter) = args.filter {
            config.input.filter = Some(filter.clone());
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# msggen configuration file

[input]
# Directory scanned for *.messages.json receiver documents
dir = "."

# Only load documents whose path (relative to dir) matches this glob
# filter = "network/**"

[output]
# Output directory for generated headers and sources
dir = "./generated"

# Text placed at the top of every generated file
# license_header = "// Copyright (C) 2024 Example Inc. All rights reserved."

[codegen]
# Namespace of the receiver classes
namespace = "PurcFetcher"

# Indentation: spaces2, spaces4 or tabs
indent = "spaces4"

# Line endings: lf or crlf
line_ending = "lf"

# Teach the generator about project types.
#
# [types.templates.Ref]
# headers = ["<wtf/Ref.h>"]
#
# [types.headers]
# "PurcFetcher::Cookie" = ["<Cookie.h>"]
#
# [types.header_conditions]
# "\"RemoteLayerTreeTransaction.h\"" = ["PLATFORM(COCOA)"]
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Input directory override.
    pub input: Option<PathBuf>,

    /// Output directory override.
    pub output: Option<PathBuf>,

    /// Filter override.
    pub filter: Option<String>,
}
