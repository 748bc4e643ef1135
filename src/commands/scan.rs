//! Scan command handler: register paper directories found on disk.

use anyhow::{Context, Result};
use papershelf_core::{UpsertOutcome, scan_library};
use tracing::{debug, info};

use super::open_registry;
use crate::cli::ScanArgs;
use crate::config_runtime::Settings;

pub(crate) async fn run_scan_command(args: &ScanArgs, settings: &Settings) -> Result<()> {
    let root = args.dir.as_ref().unwrap_or(&settings.library_dir);
    let papers = scan_library(root)
        .await
        .with_context(|| format!("Failed to scan '{}'", root.display()))?;
    info!(found = papers.len(), root = %root.display(), "scan found paper directories");

    let registry = open_registry(settings).await?;
    let (mut added, mut updated, mut unchanged) = (0usize, 0usize, 0usize);
    for paper in &papers {
        let existing = registry.lookup(&paper.identity.key()).await?;
        let outcome = registry.upsert(&paper.to_record(existing.as_ref())).await?;
        debug!(paper = %paper.identity, outcome = %outcome, "registered scanned paper");
        match outcome {
            UpsertOutcome::Inserted => added += 1,
            UpsertOutcome::Updated => updated += 1,
            UpsertOutcome::Unchanged => unchanged += 1,
        }
    }

    println!(
        "Scanned {}: {} paper directories ({added} added, {updated} updated, {unchanged} unchanged)",
        root.display(),
        papers.len()
    );
    Ok(())
}
