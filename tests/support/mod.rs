//! Test doubles shared by the integration test targets.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use repomark::database::document_store::{BookmarkMetadata, RemoteStore, SqliteDocumentStore};
use repomark::database::Database;
use repomark::managers::bookmark_store::BookmarkStore;
use repomark::services::github_client::RepoLookup;
use repomark::types::bookmark::BookmarkRecord;
use repomark::types::errors::{GitHubError, StoreError};
use repomark::types::github::{Repository, RepositoryOwner};

/// Builds a repository payload for `owner/name`.
pub fn repo(id: u64, full_name: &str) -> Repository {
    let (owner, name) = full_name.split_once('/').unwrap_or(("", full_name));
    Repository {
        id,
        name: name.to_string(),
        full_name: full_name.to_string(),
        html_url: format!("https://github.com/{}", full_name),
        description: Some(format!("{} description", name)),
        language: Some("Rust".to_string()),
        owner: Some(RepositoryOwner {
            login: owner.to_string(),
            avatar_url: None,
        }),
    }
}

/// In-memory `RepoLookup` that records every identifier it is asked for.
#[derive(Default)]
pub struct FakeLookup {
    repos: HashMap<String, Repository>,
    rate_limited: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub fn with(repos: &[Repository]) -> Self {
        Self {
            repos: repos
                .iter()
                .map(|r| (r.full_name.to_lowercase(), r.clone()))
                .collect(),
            ..Self::default()
        }
    }

    /// Registers `alias` as another name resolving to `repo`, like a renamed repository.
    pub fn alias(mut self, alias: &str, repo: &Repository) -> Self {
        self.repos.insert(alias.to_lowercase(), repo.clone());
        self
    }

    pub fn rate_limit(mut self, full_name: &str) -> Self {
        self.rate_limited.insert(full_name.to_lowercase());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepoLookup for FakeLookup {
    async fn lookup_repo(&self, full_name: &str) -> Result<Repository, GitHubError> {
        self.calls.lock().unwrap().push(full_name.to_string());
        let key = full_name.to_lowercase();
        if self.rate_limited.contains(&key) {
            return Err(GitHubError::Api {
                status: 403,
                message: "API rate limit exceeded".to_string(),
            });
        }
        self.repos.get(&key).cloned().ok_or(GitHubError::Api {
            status: 404,
            message: "Not Found".to_string(),
        })
    }
}

/// Wraps the SQLite store, counting calls and failing chosen operations.
pub struct CountingStore {
    inner: SqliteDocumentStore,
    calls: AtomicUsize,
    failing_deletes: Mutex<HashSet<String>>,
    fail_writes: Mutex<bool>,
    fail_reads: Mutex<bool>,
}

impl CountingStore {
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().expect("open_in_memory failed"));
        Self {
            inner: SqliteDocumentStore::new(db),
            calls: AtomicUsize::new(0),
            failing_deletes: Mutex::new(HashSet::new()),
            fail_writes: Mutex::new(false),
            fail_reads: Mutex::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.failing_deletes.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    /// Makes `list` fail, like an unreachable backend.
    pub fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for CountingStore {
    async fn create_if_absent(
        &self,
        user_id: &str,
        record: &BookmarkRecord,
    ) -> Result<bool, StoreError> {
        self.hit();
        self.check_write()?;
        self.inner.create_if_absent(user_id, record).await
    }

    async fn create_many(
        &self,
        user_id: &str,
        records: &[BookmarkRecord],
    ) -> Result<Vec<String>, StoreError> {
        self.hit();
        self.check_write()?;
        self.inner.create_many(user_id, records).await
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<BookmarkRecord>, StoreError> {
        self.hit();
        self.inner.get(user_id, id).await
    }

    async fn list(&self, user_id: &str) -> Result<Vec<BookmarkRecord>, StoreError> {
        self.hit();
        if *self.fail_reads.lock().unwrap() {
            return Err(StoreError::Unavailable("read rejected".to_string()));
        }
        self.inner.list(user_id).await
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        self.hit();
        if self.failing_deletes.lock().unwrap().contains(id) {
            return Err(StoreError::Unavailable(format!("cannot delete {}", id)));
        }
        self.inner.delete(user_id, id).await
    }

    async fn delete_many(&self, user_id: &str, ids: &[String]) -> Result<(), StoreError> {
        self.hit();
        self.inner.delete_many(user_id, ids).await
    }

    async fn exists(&self, user_id: &str, id: &str) -> Result<bool, StoreError> {
        self.hit();
        self.inner.exists(user_id, id).await
    }

    async fn update_metadata(
        &self,
        user_id: &str,
        id: &str,
        metadata: &BookmarkMetadata,
    ) -> Result<(), StoreError> {
        self.hit();
        self.inner.update_metadata(user_id, id, metadata).await
    }
}

/// A store controller signed in as `user`, over a fresh counting store.
pub async fn signed_in_store(user: &str) -> (Arc<BookmarkStore>, Arc<CountingStore>) {
    let remote = Arc::new(CountingStore::new());
    let store = Arc::new(BookmarkStore::new(remote.clone()));
    store
        .sync_identity(Some(user.to_string()))
        .await
        .expect("initial sync failed");
    (store, remote)
}
