//! filecmp: line-by-line comparison of two text files.
//!
//! Entry point for the `filecmp` binary. One-shot subcommands (`tree`, `cat`,
//! `compare`) print JSON (or a side-by-side rendering) to stdout; `serve`
//! runs the JSON-lines request server on stdin/stdout.
//!
//! # Startup sequence
//!
//! 1. Parse arguments.
//! 2. Load config: `--config` must exist and parse, the default XDG path
//!    falls back to defaults when missing or broken.
//! 3. Install the tracing subscriber on stderr; stdout carries results only.
//!    Any config problem from step 2 is reported here, once logging is up.
//! 4. Run the subcommand. Failures print to stderr and exit with code 1.

mod protocol;
mod render;
mod server;

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use filecmp_core::config::config_path;
use filecmp_core::{AlignAlgorithm, CompareRequest, CompareService, Config, ConfigError};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "filecmp", version, about = "Line-by-line comparison of two text files")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/filecmp/config.toml).
    #[arg(long, global = true, env = "FILECMP_CONFIG")]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the filtered directory tree as JSON.
    Tree { directory: String },

    /// Print a file's content as JSON.
    Cat { file: String },

    /// Compare two files line by line.
    Compare {
        left: String,
        right: String,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Total width of the side-by-side output.
        #[arg(long, default_value_t = 120)]
        width: usize,

        /// Overrides `[diff] algorithm` from the config.
        #[arg(long)]
        algorithm: Option<AlignAlgorithm>,
    },

    /// Serve JSON-lines requests on stdin/stdout.
    Serve {
        /// Overrides `[server] workers` from the config.
        #[arg(long)]
        workers: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    SideBySide,
}

/// Loads the config. An explicit path is a hard error; the default path
/// degrades to defaults and returns the problem for later reporting.
fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<(Config, Option<ConfigError>)> {
    match explicit {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            Ok((config, None))
        }
        None => Ok(Config::load_or_default(&config_path())),
    }
}

/// Maps the configured level plus `-v` count onto a tracing level.
fn log_level(configured: &str, verbose: u8) -> Level {
    let base = configured.parse::<Level>().unwrap_or(Level::INFO);
    match verbose {
        0 => base,
        1 => base.max(Level::DEBUG),
        _ => Level::TRACE,
    }
}

fn init_tracing(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("writing JSON output")?;
    writeln!(stdout)?;
    Ok(())
}

async fn run(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    match cli.command {
        Command::Tree { directory } => {
            let service = CompareService::new(&config);
            let tree = service
                .list_tree(&directory)
                .with_context(|| format!("listing {directory}"))?;
            print_json(&tree)
        }
        Command::Cat { file } => {
            let service = CompareService::new(&config);
            let content = service
                .file_content(&file)
                .with_context(|| format!("reading {file}"))?;
            print_json(&content)
        }
        Command::Compare { left, right, format, width, algorithm } => {
            if let Some(algorithm) = algorithm {
                config.diff.algorithm = algorithm;
            }
            let service = CompareService::new(&config);
            let response = service.compare(&CompareRequest::new(left, right))?;
            match format {
                Format::Json => print_json(&response),
                Format::SideBySide => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(render::side_by_side(&response.diff, width).as_bytes())?;
                    writeln!(stdout, "{}", render::summary(&response.stats))?;
                    Ok(())
                }
            }
        }
        Command::Serve { workers } => {
            if let Some(workers) = workers {
                config.server.workers = workers;
            }
            config.validate()?;
            let term_flag =
                server::register_shutdown_signals().context("registering signal handlers")?;
            let service = Arc::new(CompareService::new(&config));
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            server::serve(service, &config, input, tokio::io::stdout(), Arc::clone(&term_flag))
                .await?;
            if term_flag.load(Ordering::Relaxed) {
                // The blocking stdin reader would hold up runtime shutdown.
                std::process::exit(0);
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = load_config(cli.config.as_ref())?;
    init_tracing(log_level(&config.log.level, cli.verbose));
    if let Some(e) = config_error {
        tracing::warn!("{e}; using default configuration");
    }

    run(cli, config).await
}
