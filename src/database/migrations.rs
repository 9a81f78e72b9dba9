//! Schema migrations for the repomark SQLite database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// Migrations are versioned: each runs exactly once and is recorded in
/// the `schema_version` table. Safe to call on every startup.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    // WAL is ignored by in-memory databases, which is fine
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Initial schema: per-user bookmark documents")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Add updated_at to bookmark documents, index by bookmark time")?;
    }

    Ok(())
}

fn record_version(
    conn: &Connection,
    version: i32,
    description: &str,
) -> Result<(), rusqlite::Error> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: one row per (user, repository) document.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS bookmark_documents (
            user_id TEXT NOT NULL,
            repo_id TEXT NOT NULL,
            name TEXT NOT NULL,
            full_name TEXT NOT NULL,
            html_url TEXT NOT NULL,
            description TEXT,
            language TEXT,
            bookmarked_at TEXT NOT NULL,
            seq INTEGER NOT NULL,
            PRIMARY KEY (user_id, repo_id)
        );

        CREATE INDEX IF NOT EXISTS idx_bookmark_documents_user_seq
            ON bookmark_documents(user_id, seq);
        ",
    )
}

/// V2: metadata patch support for databases created by V1.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    if conn
        .prepare("SELECT updated_at FROM bookmark_documents LIMIT 0")
        .is_err()
    {
        conn.execute_batch("ALTER TABLE bookmark_documents ADD COLUMN updated_at TEXT;")?;
    }
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_bookmark_documents_user_time
             ON bookmark_documents(user_id, bookmarked_at);",
    )
}
