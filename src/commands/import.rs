//! Import command handler: copy loose PDFs into the library and register them.

use anyhow::{Context, Result};
use papershelf_core::{PaperLayout, PaperRecord, PaperRegistry, PdfImport, UpsertOutcome, collect_pdf_imports};
use tracing::{debug, warn};

use super::open_registry;
use crate::cli::ImportArgs;
use crate::config_runtime::Settings;

/// What happened to one imported PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportResult {
    Registered(UpsertOutcome),
    /// Same version already registered; only the PDF flag was set.
    PdfFlagged,
    /// A newer version is already registered.
    Superseded,
}

pub(crate) async fn run_import_command(args: &ImportArgs, settings: &Settings) -> Result<()> {
    let imports = collect_pdf_imports(&args.dir)
        .await
        .with_context(|| format!("Failed to read PDFs from '{}'", args.dir.display()))?;

    for rejected in &imports.rejected {
        warn!(path = %rejected.display(), "Skipping PDF whose name is not an arXiv identifier");
    }
    if imports.accepted.is_empty() {
        println!(
            "No importable PDFs found in {} ({} skipped)",
            args.dir.display(),
            imports.rejected.len()
        );
        return Ok(());
    }

    let registry = open_registry(settings).await?;
    let mut imported = 0usize;
    for import in &imports.accepted {
        let result = import_one(&registry, settings, import).await?;
        debug!(paper = %import.identity, ?result, "imported PDF");
        match result {
            ImportResult::Registered(outcome) => {
                imported += 1;
                println!("{outcome}\t{}", import.identity);
            }
            ImportResult::PdfFlagged => {
                imported += 1;
                println!("pdf_added\t{}", import.identity);
            }
            ImportResult::Superseded => {
                println!("superseded\t{}", import.identity);
            }
        }
    }

    println!(
        "Imported {imported} of {} PDFs ({} skipped)",
        imports.accepted.len(),
        imports.rejected.len()
    );
    Ok(())
}

async fn import_one(
    registry: &PaperRegistry,
    settings: &Settings,
    import: &PdfImport,
) -> Result<ImportResult> {
    let key = import.identity.key();
    let existing = registry.lookup(&key).await?;
    if let Some(entry) = &existing
        && entry.version > import.identity.version
    {
        return Ok(ImportResult::Superseded);
    }

    let layout = PaperLayout::new(&settings.library_dir, &import.identity);
    tokio::fs::create_dir_all(&layout.pdf_dir)
        .await
        .with_context(|| format!("Failed to create '{}'", layout.pdf_dir.display()))?;
    if !tokio::fs::try_exists(&layout.pdf_file).await.unwrap_or(false) {
        tokio::fs::copy(&import.path, &layout.pdf_file)
            .await
            .with_context(|| {
                format!(
                    "Failed to copy '{}' to '{}'",
                    import.path.display(),
                    layout.pdf_file.display()
                )
            })?;
    }

    // Keep title and metadata of an entry already at this version.
    if existing.is_some_and(|entry| entry.version == import.identity.version) {
        registry.set_artifacts(&key, None, Some(true)).await?;
        return Ok(ImportResult::PdfFlagged);
    }

    let record = PaperRecord::new(import.identity.clone())
        .with_description(import.placeholder_title(), "")
        .with_artifacts(layout.paper_dir.to_string_lossy(), false, true);
    Ok(ImportResult::Registered(registry.upsert(&record).await?))
}
