//! # msggen
//!
//! Generates IPC message receivers from interface documents.
//!
//! ## Usage
//!
//! ```bash
//! # Generate sources from the current directory
//! msggen generate
//!
//! # Generate into a specific output directory
//! msggen generate --input ./messages --output ./generated
//!
//! # Watch mode for development
//! msggen generate --watch
//!
//! # Dry run to preview changes
//! msggen generate --dry-run
//!
//! # Initialize configuration
//! msggen init
//!
//! # Check that generated sources are up-to-date
//! msggen validate --output ./generated
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use msggen::GeneratedOutput;
use msggen_cli::{
    config::{CliArgs, Config, ConfigManager},
    error::CliError,
    generator::ArtifactGenerator,
    loader::ModelLoader,
    scanner::ModelScanner,
    watcher::FileWatcher,
    writer::{self, FileWriter, WriteResult},
};

#[derive(Parser)]
#[command(name = "msggen")]
#[command(version, about = "Generate IPC message receivers from interface documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate headers, dispatchers and the message registry
    Generate {
        /// Directory containing *.messages.json documents
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory for generated sources
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Watch for document changes and regenerate
        #[arg(short, long)]
        watch: bool,

        /// Preview changes without writing files
        #[arg(long)]
        dry_run: bool,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only load documents whose relative path matches this glob
        #[arg(long)]
        filter: Option<String>,

        /// Log engine progress to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Initialize a new msggen configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "msggen.toml")]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Check that generated sources are up-to-date
    Validate {
        /// Directory containing *.messages.json documents
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory holding the generated sources
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Generate { verbose: true, .. });
    init_tracing(verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            match e {
                CliError::Validation(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "msggen=debug,msggen_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Generate {
            input,
            output,
            watch,
            dry_run,
            config,
            filter,
            verbose: _,
        } => {
            let config = load_config(config.as_deref(), input, output, filter)?;
            if watch {
                run_watch_mode(&config, dry_run)
            } else {
                run_generate(&config, dry_run)
            }
        }

        Commands::Init { output, force } => cmd_init(output, force),

        Commands::Validate {
            input,
            output,
            config,
        } => {
            let config = load_config(config.as_deref(), input, output, None)?;
            cmd_validate(&config)
        }
    }
}

fn load_config(
    path: Option<&Path>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    filter: Option<String>,
) -> Result<Config, CliError> {
    let config = ConfigManager::load(path)?;
    Ok(ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            input,
            output,
            filter,
        },
    ))
}

/// Scan, load and generate entirely in memory.
///
/// Returns `None` when there is nothing to generate.
fn build_output(config: &Config) -> Result<Option<GeneratedOutput>, CliError> {
    let mut scanner = ModelScanner::new(&config.input.dir);
    if let Some(pattern) = &config.input.filter {
        scanner = scanner.with_filter(pattern)?;
    }

    let files = scanner.scan_allow_empty()?;
    if files.is_empty() {
        println!("{}", "No message model files found.".yellow());
        return Ok(None);
    }
    println!("  Found {} model file(s)", files.len().to_string().green());

    let receivers = ModelLoader::new().load_all(&files)?;
    let output = ArtifactGenerator::new(config)?.generate(&receivers)?;
    info!(receivers = receivers.len(), files = output.len(), "generation finished");

    Ok(Some(output))
}

/// Run generation once.
fn run_generate(config: &Config, dry_run: bool) -> Result<(), CliError> {
    println!("{}", "Scanning for message model files...".cyan());

    let Some(output) = build_output(config)? else {
        return Ok(());
    };
    println!("  Generated {} file(s)", output.len().to_string().green());

    let writer = FileWriter::new(dry_run);
    for result in writer.write_all(&config.output.dir, &output)? {
        match result {
            WriteResult::Written { path, bytes } => {
                println!(
                    "{} Written {} bytes to {}",
                    "✓".green(),
                    bytes,
                    path.display()
                );
            }
            WriteResult::Unchanged { path } => {
                println!("{} Unchanged {}", "·".dimmed(), path.display());
            }
            WriteResult::DryRun { content, path } => {
                println!(
                    "{} Would write to {}:",
                    "[dry-run]".yellow(),
                    path.display()
                );
                println!("{}", "─".repeat(60).dimmed());
                println!("{}", content);
                println!("{}", "─".repeat(60).dimmed());
            }
        }
    }

    Ok(())
}

/// Run in watch mode.
fn run_watch_mode(config: &Config, dry_run: bool) -> Result<(), CliError> {
    println!("{}", "Starting watch mode...".cyan());
    println!("  Watching: {}", config.input.dir.display());
    println!("  Press Ctrl+C to stop\n");

    run_generate(config, dry_run)?;

    let watcher = FileWatcher::new(&config.input.dir);
    let (_debouncer, rx) = watcher.watch()?;

    println!("\n{}", "Watching for changes...".cyan());

    while let Ok(event) = rx.recv() {
        if event.is_error() {
            println!(
                "{} {}",
                "Watch error:".red(),
                event.error_message().unwrap_or("Unknown error")
            );
            continue;
        }

        if let Some(path) = event.path() {
            debug!(path = %path.display(), "model changed");
            println!("\n{} {}", "File changed:".cyan(), path.display());
        }

        if let Err(e) = run_generate(config, dry_run) {
            println!("{} {}", "Generation error:".red(), e);
        }

        println!("\n{}", "Watching for changes...".cyan());
    }

    Ok(())
}

/// Init command implementation.
fn cmd_init(output: PathBuf, force: bool) -> Result<(), CliError> {
    if output.exists() && !force {
        println!("  Use --force to overwrite");
        return Err(CliError::Validation(format!(
            "Configuration file already exists: {}",
            output.display()
        )));
    }

    std::fs::write(&output, ConfigManager::default_config_content())?;

    println!(
        "{} Created configuration file: {}",
        "✓".green(),
        output.display()
    );

    Ok(())
}

/// Validate command implementation.
fn cmd_validate(config: &Config) -> Result<(), CliError> {
    println!("{}", "Validating generated sources...".cyan());

    let Some(output) = build_output(config)? else {
        return Ok(());
    };

    let stale = writer::stale_files(&config.output.dir, &output);
    if stale.is_empty() {
        println!("{} Generated sources are up-to-date", "✓".green());
        return Ok(());
    }

    for path in &stale {
        println!("  {} {}", "✗".red(), path.display());
    }
    println!("  Run 'msggen generate' to update");
    Err(CliError::Validation(format!(
        "{} generated file(s) are out of date",
        stale.len()
    )))
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}
