//! Integration tests for the paper registry.
//!
//! These tests verify PaperRegistry operations against a real SQLite database.

use futures_util::TryStreamExt;
use papershelf_core::{
    Database, DatabaseOptions, FilterField, ListFilter, PaperRecord, PaperRegistry, RegistryEntry,
    RegistryError, UpsertOutcome, parse,
};
use tempfile::TempDir;

/// Helper to create a test registry on a file database.
async fn setup_test_registry() -> (PaperRegistry, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("papers.db");

    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");

    (PaperRegistry::new(db), temp_dir)
}

fn record(raw: &str) -> PaperRecord {
    PaperRecord::new(parse(raw))
}

async fn snapshot(registry: &PaperRegistry) -> Vec<RegistryEntry> {
    registry.list_all(None).fetch_all().await.unwrap()
}

// ==================== Upsert ====================

#[tokio::test]
async fn test_upsert_inserts_then_lookup_finds_entry() {
    let (registry, _temp_dir) = setup_test_registry().await;

    let outcome = registry
        .upsert(&record("cond-mat/0102536v1").with_description("Cusp", "A. Author"))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Inserted);

    let entry = registry
        .lookup(&parse("cond-mat/0102536").key())
        .await
        .unwrap()
        .expect("entry should exist");
    assert_eq!(entry.category(), Some("cond-mat"));
    assert_eq!(entry.id_number, "0102536");
    assert_eq!(entry.version, 1);
    assert_eq!(entry.title, "Cusp");
    assert!(!entry.downloaded_at.is_empty());
}

#[tokio::test]
async fn test_lookup_is_exact_match() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry.upsert(&record("cs/0303006v1")).await.unwrap();

    assert!(registry.lookup(&parse("cs/030300").key()).await.unwrap().is_none());
    assert!(registry.lookup(&parse("0303006").key()).await.unwrap().is_none());
    assert!(registry.lookup(&parse("math/0303006").key()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let (registry, _temp_dir) = setup_test_registry().await;
    let paper = record("2101.00001v2").with_artifacts("none/2101.00001", true, true);

    registry.upsert(&paper).await.unwrap();
    let once = snapshot(&registry).await;

    let outcome = registry.upsert(&paper).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(snapshot(&registry).await, once, "second upsert must not change the row");
}

#[tokio::test]
async fn test_upsert_never_downgrades() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry
        .upsert(&record("hep-th/9901001v3").with_description("Third", ""))
        .await
        .unwrap();
    let before = snapshot(&registry).await;

    for lower in ["hep-th/9901001v2", "hep-th/9901001v1", "hep-th/9901001"] {
        let outcome = registry
            .upsert(&record(lower).with_description("Older", ""))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged, "{lower} must be refused");
    }

    assert_eq!(snapshot(&registry).await, before);
}

#[tokio::test]
async fn test_upsert_higher_version_updates_and_restamps() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry.upsert(&record("2101.00001v1")).await.unwrap();
    backdate_downloads(&registry).await;

    let outcome = registry
        .upsert(&record("2101.00001v2").with_description("Revised", ""))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);

    let entries = snapshot(&registry).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].version, 2);
    assert_eq!(entries[0].title, "Revised");
    assert_ne!(entries[0].downloaded_at, "2000-01-01 00:00:00");
}

#[tokio::test]
async fn test_upsert_same_version_keeps_download_time() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry.upsert(&record("2101.00001v1")).await.unwrap();
    backdate_downloads(&registry).await;

    registry
        .upsert(&record("2101.00001v1").with_description("Retitled", ""))
        .await
        .unwrap();

    let entries = snapshot(&registry).await;
    assert_eq!(entries[0].title, "Retitled");
    assert_eq!(entries[0].downloaded_at, "2000-01-01 00:00:00");
}

/// Pins every row's download time so restamping is observable.
async fn backdate_downloads(registry: &PaperRegistry) {
    sqlx::query("UPDATE papers SET downloaded_at = '2000-01-01 00:00:00'")
        .execute(registry.database().pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_modern_and_legacy_keys_are_distinct() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry.upsert(&record("0102536")).await.unwrap();
    registry.upsert(&record("cond-mat/0102536")).await.unwrap();

    assert_eq!(registry.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_zero_version_spelling_shares_row() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry.upsert(&record("2101.00001v2")).await.unwrap();

    let outcome = registry.upsert(&record("2101.00001v0")).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Unchanged);

    assert_eq!(registry.count().await.unwrap(), 1);
    let entry = registry
        .lookup(&parse("2101.00001").key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.version, 2);
}

#[tokio::test]
async fn test_upsert_empty_id_number_is_rejected() {
    let (registry, _temp_dir) = setup_test_registry().await;

    let result = registry.upsert(&record("cs/")).await;
    assert!(matches!(result, Err(RegistryError::InvalidIdentity { .. })));
}

// ==================== Listing ====================

#[tokio::test]
async fn test_list_all_preserves_insertion_order() {
    let (registry, _temp_dir) = setup_test_registry().await;
    for raw in ["2101.00003", "cs/0303006", "2101.00001"] {
        registry.upsert(&record(raw)).await.unwrap();
    }
    // An update does not move an entry.
    registry.upsert(&record("2101.00003v2")).await.unwrap();

    let order: Vec<String> = snapshot(&registry)
        .await
        .iter()
        .map(|entry| entry.key().to_string())
        .collect();
    assert_eq!(order, vec!["2101.00003", "cs/0303006", "2101.00001"]);
}

#[tokio::test]
async fn test_listing_is_restartable_and_sees_new_entries() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry.upsert(&record("2101.00001")).await.unwrap();

    let listing = registry.list_all(None);
    let first: Vec<RegistryEntry> = listing.stream().try_collect().await.unwrap();
    assert_eq!(first.len(), 1);

    registry.upsert(&record("2101.00002")).await.unwrap();
    let second = listing.fetch_all().await.unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[0], first[0]);
}

#[tokio::test]
async fn test_list_filter_is_case_insensitive_substring() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry
        .upsert(&record("2101.00001").with_description("Attention Is All You Need", "Vaswani, Shazeer"))
        .await
        .unwrap();
    registry
        .upsert(&record("cond-mat/0102536").with_description("Electron Cusp", "Author, A."))
        .await
        .unwrap();
    registry
        .upsert(&record("cs/0303006").with_description("Lambda calculus notes", "Church, A."))
        .await
        .unwrap();

    let keys = |entries: Vec<RegistryEntry>| -> Vec<String> {
        entries.into_iter().map(|entry| entry.key().to_string()).collect()
    };

    let by_title = registry
        .list_all(Some(ListFilter::new(FilterField::Title, "ATTENTION")))
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(keys(by_title), vec!["2101.00001"]);

    let by_author = registry
        .list_all(Some(ListFilter::new(FilterField::Authors, "a.")))
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(keys(by_author), vec!["cond-mat/0102536", "cs/0303006"]);

    let by_category = registry
        .list_all(Some(ListFilter::new(FilterField::Category, "cond")))
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(keys(by_category), vec!["cond-mat/0102536"]);

    let by_id = registry
        .list_all(Some(ListFilter::new(FilterField::Id, "cs/03")))
        .fetch_all()
        .await
        .unwrap();
    assert_eq!(keys(by_id), vec!["cs/0303006"]);

    let nothing = registry
        .list_all(Some(ListFilter::new(FilterField::Title, "quantum")))
        .fetch_all()
        .await
        .unwrap();
    assert!(nothing.is_empty());
}

#[tokio::test]
async fn test_list_missing_metadata() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry
        .upsert(&record("2101.00001").with_artifacts("a", false, true))
        .await
        .unwrap();
    registry
        .upsert(&record("2101.00002").with_artifacts("b", true, true))
        .await
        .unwrap();
    registry
        .upsert(&record("2101.00003").with_artifacts("c", false, false))
        .await
        .unwrap();

    let missing = registry.list_missing_metadata().await.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].id_number, "2101.00001");

    registry
        .set_artifacts(&parse("2101.00001").key(), Some(true), None)
        .await
        .unwrap();
    assert!(registry.list_missing_metadata().await.unwrap().is_empty());
}

// ==================== Concurrency ====================

#[tokio::test]
async fn test_concurrent_same_key_upserts_keep_highest_version() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::with_options(
        &temp_dir.path().join("papers.db"),
        DatabaseOptions {
            max_connections: 5,
            busy_timeout_ms: 10_000,
        },
    )
    .await
    .unwrap();
    let registry = PaperRegistry::new(db);

    let mut handles = Vec::new();
    for _ in 0..4 {
        for version in [3u32, 1, 5, 2, 4] {
            let registry = registry.clone();
            let raw = format!("1706.03762v{version}");
            handles.push(tokio::spawn(async move {
                registry.upsert(&PaperRecord::new(parse(&raw))).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let entries = snapshot(&registry).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].version, 5);
}

#[tokio::test]
async fn test_concurrent_different_key_upserts_all_land() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::with_options(
        &temp_dir.path().join("papers.db"),
        DatabaseOptions {
            max_connections: 5,
            busy_timeout_ms: 10_000,
        },
    )
    .await
    .unwrap();
    let registry = PaperRegistry::new(db);

    let mut handles = Vec::new();
    for n in 0..20 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry
                .upsert(&PaperRecord::new(parse(&format!("2101.{n:05}"))))
                .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), UpsertOutcome::Inserted);
    }

    assert_eq!(registry.count().await.unwrap(), 20);
}

// ==================== Storage failures ====================

#[tokio::test]
async fn test_closed_pool_reports_storage_unavailable() {
    let (registry, _temp_dir) = setup_test_registry().await;
    registry.database().clone().close().await;

    let result = registry.lookup(&parse("2101.00001").key()).await;
    let err = result.expect_err("closed pool must fail");
    assert!(err.is_storage_unavailable(), "got {err:?}");
}
