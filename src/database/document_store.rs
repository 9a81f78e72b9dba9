//! Per-user bookmark document store.
//!
//! [`RemoteStore`] is the capability the bookmark controller consumes: a
//! namespace per user holding one document per repository, keyed by the
//! stringified repository id. [`SqliteDocumentStore`] implements it on top of
//! the application database.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::connection::Database;
use crate::types::bookmark::BookmarkRecord;
use crate::types::errors::StoreError;

/// Fields that may be patched on an existing document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkMetadata {
    pub description: Option<String>,
    pub language: Option<String>,
}

/// Document operations over a user's bookmark namespace.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Writes `record` unless a document with its id exists. Returns whether it was created.
    async fn create_if_absent(
        &self,
        user_id: &str,
        record: &BookmarkRecord,
    ) -> Result<bool, StoreError>;
    /// Writes all records in one atomic batch, skipping ids that already exist.
    /// Returns the ids that were created.
    async fn create_many(
        &self,
        user_id: &str,
        records: &[BookmarkRecord],
    ) -> Result<Vec<String>, StoreError>;
    async fn get(&self, user_id: &str, id: &str) -> Result<Option<BookmarkRecord>, StoreError>;
    /// All documents of the namespace in creation order.
    async fn list(&self, user_id: &str) -> Result<Vec<BookmarkRecord>, StoreError>;
    /// Deleting an absent document succeeds.
    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError>;
    async fn delete_many(&self, user_id: &str, ids: &[String]) -> Result<(), StoreError>;
    async fn exists(&self, user_id: &str, id: &str) -> Result<bool, StoreError>;
    async fn update_metadata(
        &self,
        user_id: &str,
        id: &str,
        metadata: &BookmarkMetadata,
    ) -> Result<(), StoreError>;
}

/// `RemoteStore` backed by the `bookmark_documents` SQLite table.
pub struct SqliteDocumentStore {
    db: Arc<Database>,
}

struct DocumentRow {
    id: String,
    name: String,
    full_name: String,
    html_url: String,
    description: Option<String>,
    language: Option<String>,
    bookmarked_at: String,
}

impl DocumentRow {
    fn into_record(self) -> Result<BookmarkRecord, StoreError> {
        let bookmarked_at = DateTime::parse_from_rfc3339(&self.bookmarked_at)
            .map_err(|e| StoreError::CorruptDocument {
                id: self.id.clone(),
                reason: format!("bad bookmarked_at '{}': {}", self.bookmarked_at, e),
            })?
            .with_timezone(&Utc);
        Ok(BookmarkRecord::from_document(
            self.id,
            self.name,
            self.full_name,
            self.html_url,
            self.description,
            self.language,
            bookmarked_at,
        ))
    }
}

const SELECT_COLUMNS: &str =
    "SELECT repo_id, name, full_name, html_url, description, language, bookmarked_at FROM bookmark_documents";

impl SqliteDocumentStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn format_time(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<DocumentRow> {
        Ok(DocumentRow {
            id: row.get(0)?,
            name: row.get(1)?,
            full_name: row.get(2)?,
            html_url: row.get(3)?,
            description: row.get(4)?,
            language: row.get(5)?,
            bookmarked_at: row.get(6)?,
        })
    }

    /// Inserts one document, appending it after the user's newest one.
    fn insert_document(
        conn: &Connection,
        user_id: &str,
        record: &BookmarkRecord,
    ) -> Result<bool, rusqlite::Error> {
        let affected = conn.execute(
            "INSERT OR IGNORE INTO bookmark_documents \
             (user_id, repo_id, name, full_name, html_url, description, language, bookmarked_at, seq) \
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, COALESCE(MAX(seq), 0) + 1 \
             FROM bookmark_documents WHERE user_id = ?1",
            params![
                user_id,
                record.id,
                record.name,
                record.full_name,
                record.html_url,
                record.description,
                record.language,
                Self::format_time(&record.bookmarked_at),
            ],
        )?;
        Ok(affected == 1)
    }
}

#[async_trait]
impl RemoteStore for SqliteDocumentStore {
    async fn create_if_absent(
        &self,
        user_id: &str,
        record: &BookmarkRecord,
    ) -> Result<bool, StoreError> {
        let conn = self.db.connection();
        Ok(Self::insert_document(&conn, user_id, record)?)
    }

    async fn create_many(
        &self,
        user_id: &str,
        records: &[BookmarkRecord],
    ) -> Result<Vec<String>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.db.connection();
        let tx = conn.transaction()?;
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            if Self::insert_document(&tx, user_id, record)? {
                created.push(record.id.clone());
            }
        }
        tx.commit()?;
        Ok(created)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<BookmarkRecord>, StoreError> {
        let conn = self.db.connection();
        let row = conn
            .query_row(
                &format!("{} WHERE user_id = ?1 AND repo_id = ?2", SELECT_COLUMNS),
                params![user_id, id],
                Self::row_to_document,
            )
            .optional()?;
        row.map(DocumentRow::into_record).transpose()
    }

    async fn list(&self, user_id: &str) -> Result<Vec<BookmarkRecord>, StoreError> {
        let conn = self.db.connection();
        let sql = format!("{} WHERE user_id = ?1 ORDER BY seq", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], Self::row_to_document)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?.into_record()?);
        }
        Ok(results)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        self.db.connection().execute(
            "DELETE FROM bookmark_documents WHERE user_id = ?1 AND repo_id = ?2",
            params![user_id, id],
        )?;
        Ok(())
    }

    async fn delete_many(&self, user_id: &str, ids: &[String]) -> Result<(), StoreError> {
        let mut conn = self.db.connection();
        let tx = conn.transaction()?;
        for id in ids {
            tx.execute(
                "DELETE FROM bookmark_documents WHERE user_id = ?1 AND repo_id = ?2",
                params![user_id, id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn exists(&self, user_id: &str, id: &str) -> Result<bool, StoreError> {
        let count: i64 = self.db.connection().query_row(
            "SELECT COUNT(*) FROM bookmark_documents WHERE user_id = ?1 AND repo_id = ?2",
            params![user_id, id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn update_metadata(
        &self,
        user_id: &str,
        id: &str,
        metadata: &BookmarkMetadata,
    ) -> Result<(), StoreError> {
        let now = Self::format_time(&Utc::now());
        let affected = self.db.connection().execute(
            "UPDATE bookmark_documents SET \
             description = COALESCE(?1, description), \
             language = COALESCE(?2, language), \
             updated_at = ?3 \
             WHERE user_id = ?4 AND repo_id = ?5",
            params![metadata.description, metadata.language, now, user_id, id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
