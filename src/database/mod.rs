//! repomark database layer.
//!
//! Provides SQLite connection management, schema migrations, and the
//! SQLite-backed per-user bookmark document store.
//!
//! # Usage
//!
//! ```no_run
//! use repomark::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("repomark.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! // Access the underlying connection for queries
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod document_store;
pub mod migrations;

pub use connection::Database;
pub use document_store::{RemoteStore, SqliteDocumentStore};
