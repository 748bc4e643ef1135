//! Paper registry: one persisted row per distinct paper key.
//!
//! The registry keeps the best-known record for each `(category, idNumber)`
//! pair. Versions only move forward: an upsert carrying a lower version than
//! the stored one is refused and reported as [`UpsertOutcome::Unchanged`].
//!
//! # Overview
//!
//! - [`PaperRegistry`] - Main interface for registry operations
//! - [`RegistryEntry`] - A persisted row
//! - [`PaperRecord`] - Upsert payload
//! - [`Listing`] - Lazy, restartable listing
//! - [`RegistryError`] - Operation error types
//!
//! # Example
//!
//! ```ignore
//! use papershelf_core::{Database, PaperRecord, PaperRegistry, identifier::parse};
//!
//! let registry = PaperRegistry::new(Database::new_in_memory().await?);
//! let record = PaperRecord::new(parse("cond-mat/0102536v2"));
//! registry.upsert(&record).await?;
//!
//! let entry = registry.lookup(&record.identity.key()).await?;
//! assert_eq!(entry.map(|e| e.version), Some(2));
//! ```

mod entry;
mod error;
mod repository;

pub use entry::{FilterField, ListFilter, PaperRecord, RegistryEntry, UpsertOutcome};
pub use error::{RegistryError, StorageErrorKind};
pub use repository::PaperRepository;

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

use crate::db::Database;
use crate::identifier::PaperKey;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

const SELECT_ENTRY: &str = "SELECT * FROM papers";

/// Key-scoped async locks serializing writes to the same paper.
///
/// Entries live only while some task holds or waits on them, so the map
/// stays as small as the number of keys in flight.
#[derive(Debug, Default)]
struct KeyLocks {
    locks: DashMap<PaperKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &PaperKey) -> KeyGuard<'_> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = Arc::clone(&self.locks.entry(key.clone()).or_default());
        KeyGuard {
            locks: self,
            key: key.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Held lock for one key; drops the map entry when no one else needs it.
struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: PaperKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own Arc left: nobody holds or awaits this mutex.
        self.locks
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Persisted mapping from paper key to its best-known record.
///
/// Cheap to clone; clones share the database pool and the per-key locks.
#[derive(Debug, Clone)]
pub struct PaperRegistry {
    db: Database,
    locks: Arc<KeyLocks>,
}

impl PaperRegistry {
    /// Creates a registry over the given database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            db,
            locks: Arc::new(KeyLocks::default()),
        }
    }

    /// Returns the underlying database handle.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns the entry for `key`, if one exists. Exact match only.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::StorageUnavailable`] if the query fails.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn lookup(&self, key: &PaperKey) -> Result<Option<RegistryEntry>> {
        let entry = sqlx::query_as::<_, RegistryEntry>(
            r"SELECT * FROM papers WHERE category = ? AND id_number = ?",
        )
        .bind(key.category_column())
        .bind(&key.id_number)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(entry)
    }

    /// Inserts or updates the entry for the record's key.
    ///
    /// - no entry: insert, [`UpsertOutcome::Inserted`]
    /// - stored version <= incoming: overwrite, [`UpsertOutcome::Updated`]
    /// - stored version > incoming: no write, [`UpsertOutcome::Unchanged`]
    ///
    /// `downloaded_at` is stamped on insert and when the version strictly
    /// increases, so repeating an upsert leaves the row identical. Calls for
    /// the same key are serialized, and the write is a single conditional
    /// statement, so a lower version can never overwrite a higher one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidIdentity`] for an empty id number and
    /// [`RegistryError::StorageUnavailable`] if the write fails.
    #[instrument(skip(self, record), fields(paper = %record.identity))]
    pub async fn upsert(&self, record: &PaperRecord) -> Result<UpsertOutcome> {
        validate(record)?;
        let key = record.identity.key();
        let incoming = record.identity.version;

        let _guard = self.locks.acquire(&key).await;

        // Labels the outcome only; the conditional write below enforces no-downgrade.
        let stored = sqlx::query_scalar::<_, u32>(
            r"SELECT version FROM papers WHERE category = ? AND id_number = ?",
        )
        .bind(key.category_column())
        .bind(&key.id_number)
        .fetch_optional(self.db.pool())
        .await?;

        let result = sqlx::query(
            r"INSERT INTO papers (
                category,
                id_number,
                version,
                title,
                authors,
                stored_path,
                has_metadata,
                has_pdf
              )
              VALUES (?, ?, ?, ?, ?, ?, ?, ?)
              ON CONFLICT(category, id_number) DO UPDATE SET
                downloaded_at = CASE
                    WHEN excluded.version > papers.version THEN datetime('now')
                    ELSE papers.downloaded_at
                END,
                version = excluded.version,
                title = excluded.title,
                authors = excluded.authors,
                stored_path = excluded.stored_path,
                has_metadata = excluded.has_metadata,
                has_pdf = excluded.has_pdf
              WHERE excluded.version >= papers.version",
        )
        .bind(key.category_column())
        .bind(&key.id_number)
        .bind(incoming)
        .bind(&record.title)
        .bind(&record.authors)
        .bind(&record.stored_path)
        .bind(record.has_metadata)
        .bind(record.has_pdf)
        .execute(self.db.pool())
        .await?;

        let outcome = match (result.rows_affected(), stored) {
            (0, current) => {
                warn!(stored = ?current, incoming, "refusing version downgrade");
                UpsertOutcome::Unchanged
            }
            (_, None) => UpsertOutcome::Inserted,
            (_, Some(_)) => UpsertOutcome::Updated,
        };

        debug!(outcome = %outcome, "upsert complete");
        Ok(outcome)
    }

    /// Updates artifact presence flags; `None` leaves a flag untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EntryNotFound`] if no entry exists for `key`.
    /// Returns [`RegistryError::StorageUnavailable`] if the update fails.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn set_artifacts(
        &self,
        key: &PaperKey,
        has_metadata: Option<bool>,
        has_pdf: Option<bool>,
    ) -> Result<()> {
        let result = sqlx::query(
            r"UPDATE papers
              SET has_metadata = COALESCE(?, has_metadata),
                  has_pdf = COALESCE(?, has_pdf)
              WHERE category = ? AND id_number = ?",
        )
        .bind(has_metadata)
        .bind(has_pdf)
        .bind(key.category_column())
        .bind(&key.id_number)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::EntryNotFound {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Fills in title and authors from fetched metadata and marks the entry
    /// as having metadata. Version and artifact paths are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EntryNotFound`] if no entry exists for `key`.
    /// Returns [`RegistryError::StorageUnavailable`] if the update fails.
    #[instrument(skip(self, title, authors), fields(key = %key))]
    pub async fn record_metadata(&self, key: &PaperKey, title: &str, authors: &str) -> Result<()> {
        let _guard = self.locks.acquire(key).await;
        let result = sqlx::query(
            r"UPDATE papers
              SET title = ?, authors = ?, has_metadata = 1
              WHERE category = ? AND id_number = ?",
        )
        .bind(title)
        .bind(authors)
        .bind(key.category_column())
        .bind(&key.id_number)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RegistryError::EntryNotFound {
                key: key.to_string(),
            });
        }
        debug!("metadata recorded");
        Ok(())
    }

    /// Returns a listing of entries in insertion order.
    ///
    /// Nothing is read until the listing is streamed; the same listing can be
    /// streamed repeatedly and sees the registry as of each run.
    #[must_use]
    pub fn list_all(&self, filter: Option<ListFilter>) -> Listing {
        let (sql, needle) = match filter {
            Some(filter) => (
                format!(
                    "{SELECT_ENTRY} WHERE instr(lower({}), ?) > 0 ORDER BY id ASC",
                    filter.field.column_expr()
                ),
                Some(filter.substring.to_ascii_lowercase()),
            ),
            None => (format!("{SELECT_ENTRY} ORDER BY id ASC"), None),
        };

        Listing {
            db: self.db.clone(),
            sql,
            needle,
        }
    }

    /// Lists entries that have a PDF but no metadata yet.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::StorageUnavailable`] if the query fails.
    #[instrument(skip(self))]
    pub async fn list_missing_metadata(&self) -> Result<Vec<RegistryEntry>> {
        let entries = sqlx::query_as::<_, RegistryEntry>(
            r"SELECT * FROM papers
              WHERE has_pdf = 1 AND has_metadata = 0
              ORDER BY id ASC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(entries)
    }

    /// Counts distinct papers.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::StorageUnavailable`] if the query fails.
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM papers")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

fn validate(record: &PaperRecord) -> Result<()> {
    if record.identity.id_number.trim().is_empty() {
        return Err(RegistryError::InvalidIdentity {
            raw: record.identity.to_string(),
            reason: "id number is empty".to_string(),
        });
    }
    Ok(())
}

/// A lazy, restartable registry listing.
#[derive(Debug, Clone)]
pub struct Listing {
    db: Database,
    sql: String,
    needle: Option<String>,
}

impl Listing {
    /// Streams matching entries in insertion order.
    ///
    /// Each call runs the query afresh.
    pub fn stream(&self) -> BoxStream<'_, Result<RegistryEntry>> {
        let mut query = sqlx::query_as::<_, RegistryEntry>(&self.sql);
        if let Some(needle) = &self.needle {
            query = query.bind(needle.as_str());
        }
        query
            .fetch(self.db.pool())
            .map_err(RegistryError::from)
            .boxed()
    }

    /// Collects every matching entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::StorageUnavailable`] if the query fails.
    pub async fn fetch_all(&self) -> Result<Vec<RegistryEntry>> {
        self.stream().try_collect().await
    }
}
