//! List command handler: show registry entries.

use anyhow::Result;
use futures_util::TryStreamExt;
use papershelf_core::{FilterField, ListFilter, RegistryEntry};

use super::{open_registry, print_json_line};
use crate::cli::ListArgs;
use crate::config_runtime::Settings;

pub(crate) async fn run_list_command(args: &ListArgs, settings: &Settings) -> Result<()> {
    let registry = open_registry(settings).await?;

    if args.missing_metadata {
        let entries = registry.list_missing_metadata().await?;
        for entry in &entries {
            print_entry(entry, args.json)?;
        }
        if !args.json && entries.is_empty() {
            println!("No papers are missing metadata.");
        }
        return Ok(());
    }

    let filter = args.contains.as_ref().map(|needle| {
        ListFilter::new(args.field.unwrap_or(FilterField::Title), needle.clone())
    });
    let listing = registry.list_all(filter);

    let mut shown = 0usize;
    let mut stream = listing.stream();
    while let Some(entry) = stream.try_next().await? {
        print_entry(&entry, args.json)?;
        shown += 1;
    }

    if !args.json && shown == 0 {
        println!("No papers found.");
    }
    Ok(())
}

fn print_entry(entry: &RegistryEntry, json: bool) -> Result<()> {
    if json {
        return print_json_line(entry);
    }
    println!("{}", render_entry_row(entry));
    Ok(())
}

fn render_entry_row(entry: &RegistryEntry) -> String {
    let flag = |present: bool, label: &'static str| if present { label } else { "-" };
    let title = if entry.title.is_empty() {
        "(untitled)"
    } else {
        entry.title.as_str()
    };
    format!(
        "{}\t{}{}\t{}\t{title}",
        entry.identity(),
        flag(entry.has_metadata, "M"),
        flag(entry.has_pdf, "P"),
        entry.downloaded_at,
    )
}
