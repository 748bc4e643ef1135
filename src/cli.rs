//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use papershelf_core::FilterField;

/// Track a local arXiv paper library.
///
/// Papershelf keeps one registry row per paper, never downgrades a stored
/// version, and tells you which papers need fetching.
#[derive(Parser, Debug)]
#[command(name = "papershelf")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Registry database file (overrides `db_path` in config)
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Library root directory (overrides `library_dir` in config)
    #[arg(long, value_name = "DIR", global = true)]
    pub library: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse identifiers and show their normalized form
    Parse(ParseArgs),
    /// Decide what each identifier needs (ids as arguments or one per stdin line)
    Plan(PlanArgs),
    /// Record a fetched paper in the registry
    Record(RecordArgs),
    /// List registry entries
    List(ListArgs),
    /// Register paper directories already present in the library
    Scan(ScanArgs),
    /// Import loose PDFs named after their identifiers
    Import(ImportArgs),
    /// Ask the arXiv API whether stored papers have newer versions
    CheckUpdates(CheckUpdatesArgs),
    /// Fill in title and authors for papers that have a PDF but no metadata
    FetchMetadata(FetchMetadataArgs),
}

/// Arguments for `parse`.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Raw identifiers (URLs, file names, `cs_0303006v1`, ...)
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Emit JSON lines instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Identifiers to plan; read from stdin when omitted
    pub ids: Vec<String>,

    /// Latest version known remotely, applied to every identifier
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub remote_version: Option<u32>,

    /// Emit JSON lines instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `record`.
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Identifier of the fetched paper, including its version
    pub id: String,

    /// Paper title
    #[arg(long, default_value = "")]
    pub title: String,

    /// Comma-separated authors
    #[arg(long, default_value = "")]
    pub authors: String,

    /// Metadata files were written
    #[arg(long)]
    pub metadata: bool,

    /// PDF was written
    #[arg(long)]
    pub pdf: bool,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Field to filter on (title, authors, category, id)
    #[arg(long, value_name = "FIELD", requires = "contains")]
    pub field: Option<FilterField>,

    /// Case-insensitive substring the field must contain
    #[arg(long, value_name = "TEXT")]
    pub contains: Option<String>,

    /// Only papers that have a PDF but no metadata
    #[arg(long, conflicts_with_all = ["field", "contains"])]
    pub missing_metadata: bool,

    /// Emit JSON lines instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `scan`.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory to scan (defaults to the library root)
    pub dir: Option<PathBuf>,
}

/// Arguments for `import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Directory containing PDFs named like `2101.00001v2.pdf`
    pub dir: PathBuf,
}

/// Arguments for `check-updates`.
#[derive(Args, Debug)]
pub struct CheckUpdatesArgs {
    /// Delay between API calls in milliseconds (overrides config, max 60000)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: Option<u64>,

    /// Stop after checking this many papers
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

/// Arguments for `fetch-metadata`.
#[derive(Args, Debug)]
pub struct FetchMetadataArgs {
    /// Delay between API calls in milliseconds (overrides config, max 60000)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: Option<u64>,

    /// Stop after this many papers
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Cli::try_parse_from(["papershelf"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["papershelf", "list", "-vv", "--db", "/tmp/p.db"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/p.db")));
        assert!(matches!(cli.command, Command::List(_)));
    }

    #[test]
    fn test_cli_parse_requires_ids() {
        let result = Cli::try_parse_from(["papershelf", "parse"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_plan_remote_version() {
        let cli = Cli::try_parse_from(["papershelf", "plan", "1706.03762", "--remote-version", "3"])
            .unwrap();
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.ids, vec!["1706.03762"]);
        assert_eq!(args.remote_version, Some(3));
    }

    #[test]
    fn test_cli_plan_rejects_zero_remote_version() {
        let result = Cli::try_parse_from(["papershelf", "plan", "--remote-version", "0"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_record_flags() {
        let cli = Cli::try_parse_from([
            "papershelf",
            "record",
            "cs/0303006v2",
            "--title",
            "Some Title",
            "--pdf",
        ])
        .unwrap();
        let Command::Record(args) = cli.command else {
            panic!("expected record");
        };
        assert_eq!(args.title, "Some Title");
        assert!(args.pdf);
        assert!(!args.metadata);
    }

    #[test]
    fn test_cli_list_field_requires_contains() {
        assert!(Cli::try_parse_from(["papershelf", "list", "--field", "title"]).is_err());

        let cli =
            Cli::try_parse_from(["papershelf", "list", "--field", "id", "--contains", "cs/"]).unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.field, Some(FilterField::Id));
        assert_eq!(args.contains.as_deref(), Some("cs/"));
    }

    #[test]
    fn test_cli_list_rejects_unknown_field() {
        let result = Cli::try_parse_from(["papershelf", "list", "--field", "doi", "--contains", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_check_updates_delay_range() {
        let result = Cli::try_parse_from(["papershelf", "check-updates", "--delay-ms", "60001"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_fetch_metadata_args() {
        let cli = Cli::try_parse_from(["papershelf", "fetch-metadata", "--delay-ms", "0", "--limit", "3"])
            .unwrap();
        let Command::FetchMetadata(args) = cli.command else {
            panic!("expected fetch-metadata");
        };
        assert_eq!(args.delay_ms, Some(0));
        assert_eq!(args.limit, Some(3));
    }
}
