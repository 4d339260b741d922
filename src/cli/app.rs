//! Main CLI application structure

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::interrupt;
use super::shell::Shell;
use crate::storage::{Config, TaskManager};

#[derive(Parser)]
#[command(name = "tasks")]
#[command(author, version, about = "Interactive multi-user task tracker")]
pub struct Cli {
    /// Path to the JSON data file
    #[arg(long, env = "TASK_TRACKER_DATA")]
    pub data_file: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;
    let path = config.resolve_data_file(cli.data_file.as_deref());
    debug!(path = %path.display(), "Using data file");

    let mut manager = TaskManager::open(&path)
        .with_context(|| format!("Cannot use data file {}", path.display()))?;

    interrupt::install()?;

    let stdin = io::stdin();
    let mut shell = Shell::new(&mut manager, stdin.lock(), io::stdout());
    shell.run()
}

/// Sends diagnostics to stderr; `RUST_LOG` overrides the level
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}
