use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::github::{owner_from_full_name, Repository};

/// A bookmarked GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    /// Stringified GitHub repository id; unique within a user's bookmarks.
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    /// Set when the bookmark document is first created; never rewritten.
    pub bookmarked_at: DateTime<Utc>,
    pub owner: String,
}

impl BookmarkRecord {
    /// Builds the record written for `repo` at time `bookmarked_at`.
    pub fn from_repository(repo: &Repository, bookmarked_at: DateTime<Utc>) -> Self {
        Self {
            id: repo.document_id(),
            name: repo.name.clone(),
            full_name: repo.full_name.clone(),
            html_url: repo.html_url.clone(),
            description: repo.description.clone(),
            language: repo.language.clone(),
            bookmarked_at,
            owner: repo.owner_login(),
        }
    }

    /// Rebuilds a record from stored document fields, deriving the owner from `full_name`.
    pub fn from_document(
        id: String,
        name: String,
        full_name: String,
        html_url: String,
        description: Option<String>,
        language: Option<String>,
        bookmarked_at: DateTime<Utc>,
    ) -> Self {
        let owner = owner_from_full_name(&full_name);
        Self {
            id,
            name,
            full_name,
            html_url,
            description,
            language,
            bookmarked_at,
            owner,
        }
    }
}

/// Lifecycle of the bookmark list for the current identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No user is signed in; the list is empty and mutations are ignored.
    Unauthenticated,
    /// The user's collection is being fetched.
    Loading,
    /// The list reflects the last successful fetch or mutation.
    Ready,
}

/// Result of `BookmarkStore::add_bookmark`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new document was written and appended to the list.
    Added(BookmarkRecord),
    /// The repository was already bookmarked locally or remotely.
    AlreadyBookmarked,
    /// No user is signed in.
    Ignored,
}
