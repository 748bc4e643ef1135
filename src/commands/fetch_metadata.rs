//! Fetch-metadata command handler: backfill titles and authors from arXiv.

use std::time::Duration;

use anyhow::{Context, Result};
use papershelf_core::{ArxivVersionSource, PaperRegistry, RegistryEntry, VersionSource};
use tracing::{debug, info, warn};

use super::{open_registry, progress_bar};
use crate::cli::FetchMetadataArgs;
use crate::config_runtime::Settings;

#[derive(Debug, Default, PartialEq, Eq)]
struct BackfillSummary {
    filled: usize,
    unknown: usize,
    failed: usize,
}

pub(crate) async fn run_fetch_metadata_command(
    args: &FetchMetadataArgs,
    settings: &Settings,
) -> Result<()> {
    let registry = open_registry(settings).await?;
    let mut entries = registry.list_missing_metadata().await?;
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }
    if entries.is_empty() {
        println!("No papers are missing metadata.");
        return Ok(());
    }

    let source = ArxivVersionSource::with_base_url(&settings.api_base_url)
        .context("Failed to set up arXiv client")?;
    let delay = args
        .delay_ms
        .map_or(settings.request_delay, Duration::from_millis);

    let summary = backfill_entries(&source, &registry, &entries, delay).await?;
    println!(
        "Filled metadata for {} of {} papers: {} unknown remotely, {} failed",
        summary.filled,
        entries.len(),
        summary.unknown,
        summary.failed
    );
    Ok(())
}

/// Looks up each entry remotely and records the title and authors found.
///
/// Remote failures are counted and skipped; registry failures abort.
async fn backfill_entries(
    source: &impl VersionSource,
    registry: &PaperRegistry,
    entries: &[RegistryEntry],
    delay: Duration,
) -> Result<BackfillSummary> {
    let progress = progress_bar(entries.len(), "fetching");
    let mut summary = BackfillSummary::default();

    for (index, entry) in entries.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let key = entry.key();
        progress.set_message(key.to_string());

        match source.latest_paper(&key).await {
            Ok(Some(paper)) if !paper.title.is_empty() => {
                registry
                    .record_metadata(&key, &paper.title, &paper.authors)
                    .await?;
                println!("{key}\t{}", paper.title);
                summary.filled += 1;
            }
            Ok(_) => {
                debug!(paper = %key, "no remote metadata");
                summary.unknown += 1;
            }
            Err(error) => {
                warn!(paper = %key, error = %error, "Metadata lookup failed");
                summary.failed += 1;
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    info!(
        filled = summary.filled,
        unknown = summary.unknown,
        failed = summary.failed,
        "metadata backfill complete"
    );
    Ok(summary)
}
