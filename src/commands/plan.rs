//! Plan command handler: decide what each identifier needs.

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result, bail};
use papershelf_core::batch::is_plannable_line;
use papershelf_core::{BatchItem, BatchPlanner, Reconciler};
use tracing::{info, warn};

use super::{open_registry, print_json_line};
use crate::cli::PlanArgs;
use crate::config_runtime::Settings;

pub(crate) async fn run_plan_command(args: &PlanArgs, settings: &Settings) -> Result<()> {
    let input = if args.ids.is_empty() {
        read_stdin()?
    } else {
        args.ids.join("\n")
    };

    let registry = open_registry(settings).await?;
    let planner = BatchPlanner::new(Reconciler::new(registry, &settings.library_dir));

    let mut planned = 0usize;
    for line in input.lines().filter(|line| is_plannable_line(line)) {
        let item = planner.plan_line(line, args.remote_version).await?;
        if item.parsed.is_best_effort() {
            warn!(raw = %item.raw, identity = %item.parsed.identity, "identifier does not look canonical");
        }

        if args.json {
            print_json_line(&item)?;
        } else {
            println!("{}", render_plan_row(&item));
        }
        planned += 1;
    }

    info!(planned, "plan complete");
    Ok(())
}

fn read_stdin() -> Result<String> {
    if io::stdin().is_terminal() {
        bail!(
            "No identifiers given\n  Suggestion: Pass ids as arguments or pipe one per line, e.g. `echo 2101.00001 | papershelf plan`"
        );
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read identifiers from stdin")?;
    Ok(buffer)
}

fn render_plan_row(item: &BatchItem) -> String {
    let destination = item
        .plan
        .layout
        .as_ref()
        .map_or_else(|| "-".to_string(), |layout| layout.pdf_file.display().to_string());
    let stored = item
        .plan
        .stored_version
        .map_or_else(|| "-".to_string(), |version| format!("v{version}"));
    format!(
        "{}\t{}\tstored={stored}\t{destination}",
        item.plan.action, item.plan.target
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use papershelf_core::{Database, PaperRegistry};

    #[tokio::test]
    async fn test_render_plan_row() {
        let registry = PaperRegistry::new(Database::new_in_memory().await.unwrap());
        let planner = BatchPlanner::new(Reconciler::new(registry, "/lib"));

        let item = planner.plan_line("cs_0303006v2", None).await.unwrap();
        assert_eq!(
            render_plan_row(&item),
            "fetch_new\tcs/0303006v2\tstored=-\t/lib/cs/0303006/pdf/0303006v2.pdf"
        );
    }
}
