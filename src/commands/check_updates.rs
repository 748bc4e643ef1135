//! Check-updates command handler: compare stored versions with arXiv.

use std::time::Duration;

use anyhow::{Context, Result};
use papershelf_core::{Action, ArxivVersionSource, RegistryEntry, VersionSource, decide};
use tracing::{debug, info, warn};

use super::{open_registry, progress_bar};
use crate::cli::CheckUpdatesArgs;
use crate::config_runtime::Settings;

/// A stored paper with a newer remote version.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AvailableUpdate {
    paper: String,
    stored: u32,
    latest: u32,
}

#[derive(Debug, Default)]
struct CheckSummary {
    checked: usize,
    failed: usize,
    unknown: usize,
    updates: Vec<AvailableUpdate>,
}

pub(crate) async fn run_check_updates_command(
    args: &CheckUpdatesArgs,
    settings: &Settings,
) -> Result<()> {
    let registry = open_registry(settings).await?;
    let mut entries = registry.list_all(None).fetch_all().await?;
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }
    if entries.is_empty() {
        println!("No papers in the registry.");
        return Ok(());
    }

    let source = ArxivVersionSource::with_base_url(&settings.api_base_url)
        .context("Failed to set up arXiv client")?;
    let delay = args
        .delay_ms
        .map_or(settings.request_delay, Duration::from_millis);

    let summary = check_entries(&source, &entries, delay).await;
    for update in &summary.updates {
        println!("{}\tv{} -> v{}", update.paper, update.stored, update.latest);
    }
    println!(
        "Checked {} papers: {} with updates, {} unknown remotely, {} failed",
        summary.checked,
        summary.updates.len(),
        summary.unknown,
        summary.failed
    );
    Ok(())
}

async fn check_entries(
    source: &impl VersionSource,
    entries: &[RegistryEntry],
    delay: Duration,
) -> CheckSummary {
    let progress = progress_bar(entries.len(), "checking");
    let mut summary = CheckSummary::default();

    for (index, entry) in entries.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let key = entry.key();
        progress.set_message(key.to_string());

        match source.latest_version(&key).await {
            Ok(latest) => {
                summary.checked += 1;
                let action = decide(Some(entry.version), latest);
                debug!(paper = %key, stored = entry.version, ?latest, action = %action, "checked paper");
                match (action, latest) {
                    (Action::FetchUpdate, Some(latest)) => summary.updates.push(AvailableUpdate {
                        paper: key.to_string(),
                        stored: entry.version,
                        latest,
                    }),
                    (Action::Skip, _) => summary.unknown += 1,
                    _ => {}
                }
            }
            Err(error) => {
                warn!(paper = %key, error = %error, "Version lookup failed");
                summary.failed += 1;
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    info!(
        checked = summary.checked,
        updates = summary.updates.len(),
        failed = summary.failed,
        "update check complete"
    );
    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use papershelf_core::{PaperKey, RemoteError, RemotePaper, parse};

    use super::*;

    struct FixedVersions(HashMap<PaperKey, u32>);

    #[async_trait]
    impl VersionSource for FixedVersions {
        async fn latest_paper(&self, key: &PaperKey) -> Result<Option<RemotePaper>, RemoteError> {
            if key.id_number == "9999999" {
                return Err(RemoteError::Request {
                    key: key.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            Ok(self.0.get(key).map(|&version| RemotePaper {
                version,
                title: String::new(),
                authors: String::new(),
            }))
        }
    }

    fn entry(raw: &str) -> RegistryEntry {
        let identity = parse(raw);
        RegistryEntry {
            id: 1,
            category_column: identity.category.clone().unwrap_or_default(),
            id_number: identity.id_number.clone(),
            version: identity.version,
            title: String::new(),
            authors: String::new(),
            stored_path: String::new(),
            downloaded_at: String::new(),
            has_metadata: false,
            has_pdf: false,
        }
    }

    #[tokio::test]
    async fn test_check_entries_reports_updates_and_failures() {
        let source = FixedVersions(HashMap::from([
            (parse("2101.00001").key(), 3),
            (parse("cs/0303006").key(), 1),
        ]));
        let entries = vec![
            entry("2101.00001v1"),
            entry("cs/0303006v1"),
            entry("hep-th/9901001v2"),
            entry("hep-th/9999999v1"),
        ];

        let summary = check_entries(&source, &entries, Duration::ZERO).await;
        assert_eq!(summary.checked, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unknown, 1);
        assert_eq!(
            summary.updates,
            vec![AvailableUpdate {
                paper: "2101.00001".to_string(),
                stored: 1,
                latest: 3,
            }]
        );
    }
}
