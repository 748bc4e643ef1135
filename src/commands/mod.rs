//! CLI command handlers.

mod check_updates;
mod fetch_metadata;
mod import;
mod list;
mod parse;
mod plan;
mod record;
mod scan;

use std::fs;
use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use papershelf_core::{Database, PaperRegistry};
use tracing::debug;

use crate::cli::Command;
use crate::config_runtime::Settings;

/// Runs the selected subcommand.
pub(crate) async fn dispatch(command: Command, settings: &Settings) -> Result<()> {
    match command {
        Command::Parse(args) => parse::run_parse_command(&args),
        Command::Plan(args) => plan::run_plan_command(&args, settings).await,
        Command::Record(args) => record::run_record_command(&args, settings).await,
        Command::List(args) => list::run_list_command(&args, settings).await,
        Command::Scan(args) => scan::run_scan_command(&args, settings).await,
        Command::Import(args) => import::run_import_command(&args, settings).await,
        Command::CheckUpdates(args) => {
            check_updates::run_check_updates_command(&args, settings).await
        }
        Command::FetchMetadata(args) => {
            fetch_metadata::run_fetch_metadata_command(&args, settings).await
        }
    }
}

/// Opens the registry database, creating its parent directory when needed.
pub(crate) async fn open_registry(settings: &Settings) -> Result<PaperRegistry> {
    let db_path = &settings.db_path;
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory '{}'", parent.display())
        })?;
    }

    debug!(path = %db_path.display(), "opening registry");
    let db = Database::with_options(db_path, settings.db_options)
        .await
        .with_context(|| format!("Failed to open registry database '{}'", db_path.display()))?;
    Ok(PaperRegistry::new(db))
}

/// Serializes a value as one JSON line on stdout.
pub(crate) fn print_json_line<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Progress bar for remote walks; hidden when stderr is not a terminal.
pub(crate) fn progress_bar(total: usize, verb: &str) -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template(&format!("{{spinner}} [{{pos}}/{{len}}] {verb} {{msg}}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}
