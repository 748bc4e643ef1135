//! Record command handler: register a fetched paper.

use anyhow::{Result, bail};
use papershelf_core::{PaperLayout, PaperRecord, UpsertOutcome, parse_identifier};
use tracing::warn;

use super::open_registry;
use crate::cli::RecordArgs;
use crate::config_runtime::Settings;

pub(crate) async fn run_record_command(args: &RecordArgs, settings: &Settings) -> Result<()> {
    let parsed = parse_identifier(&args.id);
    if parsed.identity.id_number.is_empty() {
        bail!(
            "Cannot record '{}': no id number\n  Suggestion: Pass an identifier such as 2101.00001v2",
            args.id
        );
    }
    if parsed.is_best_effort() {
        warn!(raw = %args.id, identity = %parsed.identity, "recording an identifier that does not look canonical");
    }

    let layout = PaperLayout::new(&settings.library_dir, &parsed.identity);
    let record = PaperRecord::new(parsed.identity.clone())
        .with_description(args.title.clone(), args.authors.clone())
        .with_artifacts(
            layout.paper_dir.to_string_lossy(),
            args.metadata,
            args.pdf,
        );

    let registry = open_registry(settings).await?;
    let outcome = registry.upsert(&record).await?;
    match outcome {
        UpsertOutcome::Unchanged => println!(
            "{outcome}\t{}\t(a newer version is already recorded)",
            parsed.identity
        ),
        _ => println!("{outcome}\t{}", parsed.identity),
    }
    Ok(())
}
