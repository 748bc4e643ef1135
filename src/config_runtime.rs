//! Merges CLI flags, config file values and built-in defaults.
//!
//! Precedence: CLI flag > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use papershelf_core::DatabaseOptions;
use papershelf_core::remote::DEFAULT_API_URL;

use crate::app_config::{FileConfig, resolve_default_data_dir};
use crate::cli::Cli;

/// Polite delay between arXiv API calls.
pub(crate) const DEFAULT_REQUEST_DELAY_MS: u64 = 3000;

const DEFAULT_DB_FILE: &str = "papers.db";

/// Fully resolved runtime settings for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) db_path: PathBuf,
    pub(crate) library_dir: PathBuf,
    pub(crate) request_delay: Duration,
    pub(crate) api_base_url: String,
    pub(crate) db_options: DatabaseOptions,
}

impl Settings {
    pub(crate) fn resolve(cli: &Cli, file_config: Option<&FileConfig>) -> Self {
        let file = file_config.cloned().unwrap_or_default();

        let db_path = cli
            .db
            .clone()
            .or(file.db_path)
            .unwrap_or_else(default_db_path);
        let library_dir = cli
            .library
            .clone()
            .or(file.library_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let defaults = DatabaseOptions::default();
        let db_options = DatabaseOptions {
            max_connections: file.db_max_connections.unwrap_or(defaults.max_connections),
            busy_timeout_ms: file.db_busy_timeout_ms.unwrap_or(defaults.busy_timeout_ms),
        };

        Self {
            db_path,
            library_dir,
            request_delay: Duration::from_millis(
                file.request_delay_ms.unwrap_or(DEFAULT_REQUEST_DELAY_MS),
            ),
            api_base_url: file
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            db_options,
        }
    }
}

fn default_db_path() -> PathBuf {
    resolve_default_data_dir().map_or_else(
        || PathBuf::from(DEFAULT_DB_FILE),
        |dir| dir.join(DEFAULT_DB_FILE),
    )
}

/// Picks the default log filter.
///
/// `-q` wins over `-v`, both win over the config file's `verbosity`, and
/// `RUST_LOG` (applied by the caller) wins over everything.
pub(crate) fn default_log_level(cli: &Cli, file_config: Option<&FileConfig>) -> &'static str {
    if cli.quiet {
        return "error";
    }
    match cli.verbose {
        0 => file_config
            .and_then(|cfg| cfg.verbosity)
            .map_or("info", |verbosity| verbosity.log_level()),
        1 => "debug",
        _ => "trace",
    }
}
