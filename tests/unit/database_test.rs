//! Unit tests for the repomark database layer (connection + migrations).

use repomark::database::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use repomark::database::Database;
use tempfile::TempDir;

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_create_document_table() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();

    let exists: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='bookmark_documents'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);
    assert!(exists, "bookmark_documents should exist after migrations");
}

#[test]
fn test_migrations_create_indexes() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();

    for index in ["idx_bookmark_documents_user_seq", "idx_bookmark_documents_user_time"] {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='index' AND name=?1",
                [index],
                |row| row.get(0),
            )
            .unwrap_or(false);
        assert!(exists, "Index '{}' should exist after migrations", index);
    }
}

#[test]
fn test_updated_at_column_added() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    let conn = db.connection();
    assert!(conn
        .prepare("SELECT updated_at FROM bookmark_documents LIMIT 0")
        .is_ok());
}

#[test]
fn test_schema_version_recorded() {
    let db = Database::open_in_memory().expect("open_in_memory failed");
    assert_eq!(get_schema_version(&db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_reopen_file_database_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("repomark.db");

    {
        let db = Database::open(&path).expect("first open failed");
        db.connection()
            .execute(
                "INSERT INTO bookmark_documents (user_id, repo_id, name, full_name, html_url, bookmarked_at, seq)
                 VALUES ('u1', '1', 'b', 'a/b', 'https://github.com/a/b', '2024-01-01T00:00:00.000Z', 1)",
                [],
            )
            .unwrap();
    }

    let db = Database::open(&path).expect("second open failed");
    let conn = db.connection();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM bookmark_documents", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
    let versions: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(versions, CURRENT_SCHEMA_VERSION as i64);
}
