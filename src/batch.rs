//! Line-oriented batch planning: parse, reconcile, record.
//!
//! The planner never downloads anything. It tells the caller what each input
//! line needs and records completed fetches back into the registry.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::identifier::{ParsedIdentifier, parse_identifier};
use crate::reconcile::{FetchPlan, Reconciler};
use crate::registry::{PaperRecord, PaperRepository, Result, UpsertOutcome};

/// One planned input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    /// Input line as given (trimmed).
    pub raw: String,
    /// Parser output for the line.
    pub parsed: ParsedIdentifier,
    /// Reconciliation result.
    pub plan: FetchPlan,
}

/// What a completed fetch produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedArtifacts {
    /// Paper title.
    pub title: String,
    /// Comma-separated authors.
    pub authors: String,
    /// Metadata files were written.
    pub has_metadata: bool,
    /// PDF was written.
    pub has_pdf: bool,
}

/// Returns true for lines that carry an identifier (not blank, not `#`).
#[must_use]
pub fn is_plannable_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// Drives parse, reconcile and upsert for batches of identifiers.
#[derive(Debug, Clone)]
pub struct BatchPlanner<R> {
    reconciler: Reconciler<R>,
}

impl<R: PaperRepository> BatchPlanner<R> {
    /// Wraps a reconciler.
    pub fn new(reconciler: Reconciler<R>) -> Self {
        Self { reconciler }
    }

    /// Returns the wrapped reconciler.
    pub fn reconciler(&self) -> &Reconciler<R> {
        &self.reconciler
    }

    /// Plans one identifier.
    ///
    /// `remote` is the remote latest version when the caller knows it. When it
    /// does not, an explicit `vN` in the input stands in for it, so asking for
    /// `2101.00001v3` while v2 is stored plans an update.
    ///
    /// # Errors
    ///
    /// Returns the registry error if the lookup fails.
    #[instrument(skip(self))]
    pub async fn plan_line(&self, raw: &str, remote: Option<u32>) -> Result<BatchItem> {
        let raw = raw.trim();
        let parsed = parse_identifier(raw);
        let known = remote.or_else(|| parsed.explicit_version());
        let plan = self.reconciler.plan(&parsed.identity, known).await?;

        Ok(BatchItem {
            raw: raw.to_string(),
            parsed,
            plan,
        })
    }

    /// Plans every identifier line in `text`, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first registry error.
    pub async fn plan_input(&self, text: &str) -> Result<Vec<BatchItem>> {
        let mut items = Vec::new();
        for line in text.lines().filter(|line| is_plannable_line(line)) {
            items.push(self.plan_line(line, None).await?);
        }
        debug!(count = items.len(), "planned batch input");
        Ok(items)
    }

    /// Records a completed fetch for `plan` in the registry.
    ///
    /// The stored path is the plan's paper directory when it has a layout.
    ///
    /// # Errors
    ///
    /// Returns the registry error if the upsert fails.
    #[instrument(skip(self, plan, artifacts), fields(target = %plan.target))]
    pub async fn record(&self, plan: &FetchPlan, artifacts: FetchedArtifacts) -> Result<UpsertOutcome> {
        let stored_path = plan
            .layout
            .as_ref()
            .map(|layout| layout.paper_dir.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = PaperRecord::new(plan.target.clone())
            .with_description(artifacts.title, artifacts.authors)
            .with_artifacts(stored_path, artifacts.has_metadata, artifacts.has_pdf);

        let outcome = self.reconciler.repository().upsert(&record).await?;
        info!(outcome = %outcome, action = %plan.action, "recorded fetch");
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::reconcile::Action;
    use crate::registry::PaperRegistry;

    async fn planner() -> BatchPlanner<PaperRegistry> {
        let registry = PaperRegistry::new(Database::new_in_memory().await.unwrap());
        BatchPlanner::new(Reconciler::new(registry, "/lib"))
    }

    #[test]
    fn test_is_plannable_line() {
        assert!(is_plannable_line("  2101.00001 "));
        assert!(!is_plannable_line("   "));
        assert!(!is_plannable_line("# reading list"));
    }

    #[tokio::test]
    async fn test_plan_input_skips_comments_and_blanks() {
        let planner = planner().await;
        let items = planner
            .plan_input("# papers\n\n2101.00001\n  cs_0303006v2  \n")
            .await
            .unwrap();

        let raws: Vec<_> = items.iter().map(|item| item.raw.as_str()).collect();
        assert_eq!(raws, vec!["2101.00001", "cs_0303006v2"]);
        assert!(items.iter().all(|item| item.plan.action == Action::FetchNew));
    }

    #[tokio::test]
    async fn test_explicit_version_stands_in_for_remote() {
        let planner = planner().await;
        let first = planner.plan_line("1706.03762", None).await.unwrap();
        planner
            .record(&first.plan, FetchedArtifacts::default())
            .await
            .unwrap();

        let bare = planner.plan_line("1706.03762", None).await.unwrap();
        assert_eq!(bare.plan.action, Action::Skip);

        let newer = planner.plan_line("1706.03762v2", None).await.unwrap();
        assert_eq!(newer.plan.action, Action::FetchUpdate);

        let remote_wins = planner.plan_line("1706.03762v2", Some(1)).await.unwrap();
        assert_eq!(remote_wins.plan.action, Action::AlreadyCurrent);
    }

    #[tokio::test]
    async fn test_record_stores_layout_path_and_artifacts() {
        let planner = planner().await;
        let item = planner.plan_line("cond-mat/0102536v2", None).await.unwrap();

        let outcome = planner
            .record(
                &item.plan,
                FetchedArtifacts {
                    title: "Cusp".to_string(),
                    authors: "A. Author".to_string(),
                    has_metadata: true,
                    has_pdf: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let entry = planner
            .reconciler()
            .repository()
            .lookup(&item.parsed.identity.key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.version, 2);
        assert_eq!(entry.title, "Cusp");
        assert_eq!(entry.stored_path, "/lib/cond-mat/0102536");
        assert!(entry.has_metadata && entry.has_pdf);
    }
}
