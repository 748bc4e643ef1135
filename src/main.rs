//! CLI entry point for papershelf.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod app_config;
mod cli;
mod commands;
mod config_runtime;

use cli::Cli;
use config_runtime::{Settings, default_log_level};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();
    let loaded = app_config::load_default_file_config()?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = default_log_level(&cli, loaded.config.as_ref());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so command output on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?cli, config_path = ?loaded.path, "CLI arguments parsed");

    let settings = Settings::resolve(&cli, loaded.config.as_ref());
    debug!(?settings, "runtime settings resolved");

    commands::dispatch(cli.command, &settings).await
}
