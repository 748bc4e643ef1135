//! Repository seam for registry reads and writes.
//!
//! The reconciliation engine depends on this trait rather than on
//! [`PaperRegistry`] directly, so it can be driven by any store.

use async_trait::async_trait;

use super::{PaperRecord, PaperRegistry, RegistryEntry, Result, UpsertOutcome};
use crate::identifier::PaperKey;

/// Data-access contract used by reconciliation and batch planning.
#[async_trait]
pub trait PaperRepository: Send + Sync {
    /// Returns the entry for `key`, if any.
    async fn lookup(&self, key: &PaperKey) -> Result<Option<RegistryEntry>>;

    /// Inserts or updates an entry, never downgrading its version.
    async fn upsert(&self, record: &PaperRecord) -> Result<UpsertOutcome>;
}

#[async_trait]
impl PaperRepository for PaperRegistry {
    async fn lookup(&self, key: &PaperKey) -> Result<Option<RegistryEntry>> {
        PaperRegistry::lookup(self, key).await
    }

    async fn upsert(&self, record: &PaperRecord) -> Result<UpsertOutcome> {
        PaperRegistry::upsert(self, record).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::identifier::parse;

    async fn stored_version(repo: &impl PaperRepository, raw: &str) -> Option<u32> {
        repo.lookup(&parse(raw).key())
            .await
            .unwrap()
            .map(|entry| entry.version)
    }

    #[tokio::test]
    async fn test_repository_trait_delegates_to_registry() {
        let registry = PaperRegistry::new(Database::new_in_memory().await.unwrap());

        let outcome = PaperRepository::upsert(&registry, &PaperRecord::new(parse("hep-th/9901001v2")))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(stored_version(&registry, "hep-th/9901001").await, Some(2));
        assert_eq!(stored_version(&registry, "hep-th/9901002").await, None);
    }
}
