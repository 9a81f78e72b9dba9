//! Unit tests for the SQLite-backed per-user document store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use repomark::database::document_store::BookmarkMetadata;
use repomark::database::{Database, RemoteStore, SqliteDocumentStore};
use repomark::types::bookmark::BookmarkRecord;
use repomark::types::errors::StoreError;
use repomark::types::github::{Repository, RepositoryOwner};

fn setup() -> SqliteDocumentStore {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    SqliteDocumentStore::new(Arc::new(db))
}

fn record(id: u64, full_name: &str) -> BookmarkRecord {
    let name = full_name.split('/').nth(1).unwrap_or(full_name);
    let repo = Repository {
        id,
        name: name.to_string(),
        full_name: full_name.to_string(),
        html_url: format!("https://github.com/{}", full_name),
        description: None,
        language: Some("Go".to_string()),
        owner: Some(RepositoryOwner {
            login: full_name.split('/').next().unwrap_or("").to_string(),
            avatar_url: None,
        }),
    };
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    BookmarkRecord::from_repository(&repo, at)
}

#[tokio::test]
async fn test_create_if_absent_is_conditional() {
    let store = setup();
    let rec = record(1, "a/b");

    assert!(store.create_if_absent("alice", &rec).await.unwrap());
    assert!(!store.create_if_absent("alice", &rec).await.unwrap());
    assert_eq!(store.list("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_namespaces_are_per_user() {
    let store = setup();
    let rec = record(1, "a/b");

    store.create_if_absent("alice", &rec).await.unwrap();
    assert!(store.create_if_absent("bob", &rec).await.unwrap());
    assert!(store.exists("bob", "1").await.unwrap());

    store.delete("alice", "1").await.unwrap();
    assert!(!store.exists("alice", "1").await.unwrap());
    assert!(store.exists("bob", "1").await.unwrap());
}

#[tokio::test]
async fn test_get_round_trips_fields() {
    let store = setup();
    let rec = record(42, "rust-lang/rust");
    store.create_if_absent("alice", &rec).await.unwrap();

    let stored = store.get("alice", "42").await.unwrap().expect("document missing");
    assert_eq!(stored, rec);
    assert_eq!(stored.owner, "rust-lang");
    assert!(store.get("alice", "43").await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_keeps_creation_order() {
    let store = setup();
    for (id, name) in [(30, "z/z"), (10, "a/a"), (20, "m/m")] {
        store.create_if_absent("alice", &record(id, name)).await.unwrap();
    }
    let ids: Vec<String> = store.list("alice").await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["30", "10", "20"]);
}

#[tokio::test]
async fn test_create_many_skips_existing() {
    let store = setup();
    store.create_if_absent("alice", &record(2, "c/d")).await.unwrap();

    let created = store
        .create_many("alice", &[record(1, "a/b"), record(2, "c/d"), record(3, "e/f")])
        .await
        .unwrap();
    assert_eq!(created, vec!["1".to_string(), "3".to_string()]);
    assert_eq!(store.list("alice").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_many_empty_is_noop() {
    let store = setup();
    assert!(store.create_many("alice", &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_absent_succeeds() {
    let store = setup();
    assert!(store.delete("alice", "does-not-exist").await.is_ok());
}

#[tokio::test]
async fn test_delete_many() {
    let store = setup();
    for id in 1..=4 {
        store.create_if_absent("alice", &record(id, &format!("o/r{}", id))).await.unwrap();
    }
    store
        .delete_many("alice", &["1".to_string(), "3".to_string(), "99".to_string()])
        .await
        .unwrap();
    let ids: Vec<String> = store.list("alice").await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["2", "4"]);
}

#[tokio::test]
async fn test_update_metadata_patches_only_given_fields() {
    let store = setup();
    let rec = record(5, "a/b");
    store.create_if_absent("alice", &rec).await.unwrap();

    let patch = BookmarkMetadata {
        description: Some("updated".to_string()),
        language: None,
    };
    store.update_metadata("alice", "5", &patch).await.unwrap();

    let stored = store.get("alice", "5").await.unwrap().unwrap();
    assert_eq!(stored.description.as_deref(), Some("updated"));
    assert_eq!(stored.language.as_deref(), Some("Go"));
    assert_eq!(stored.bookmarked_at, rec.bookmarked_at);
}

#[tokio::test]
async fn test_update_metadata_missing_document() {
    let store = setup();
    let err = store
        .update_metadata("alice", "404", &BookmarkMetadata::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == "404"));
}

#[tokio::test]
async fn test_corrupt_timestamp_reported() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    db.connection()
        .execute(
            "INSERT INTO bookmark_documents (user_id, repo_id, name, full_name, html_url, bookmarked_at, seq)
             VALUES ('alice', '9', 'b', 'a/b', 'https://github.com/a/b', 'yesterday', 1)",
            [],
        )
        .unwrap();
    let store = SqliteDocumentStore::new(db);
    let err = store.list("alice").await.unwrap_err();
    assert!(matches!(err, StoreError::CorruptDocument { ref id, .. } if id == "9"));
}
