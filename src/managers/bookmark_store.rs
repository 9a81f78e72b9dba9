//! Bookmark Store Controller for repomark.
//!
//! Owns the in-memory list of bookmarked repositories for the signed-in user
//! and mirrors it to and from that user's namespace in a [`RemoteStore`].
//! The list is republished on a `watch` channel after every change.
//!
//! Remote calls are not serialized: two concurrent adds may complete in
//! either order and the list reflects completion order. The state mutex is
//! never held across an `.await`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SubsecRound, Utc};
use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::database::document_store::RemoteStore;
use crate::types::bookmark::{AddOutcome, BookmarkRecord, SessionPhase};
use crate::types::errors::BookmarkError;
use crate::types::github::Repository;

/// Current time at the precision documents are stored with.
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

struct StoreState {
    user_id: Option<String>,
    phase: SessionPhase,
    /// Bumped on every identity change; in-flight work from an older
    /// generation must not touch the list.
    generation: u64,
    bookmarks: Vec<BookmarkRecord>,
    /// Why the last fetch for the current user failed, if it did.
    load_error: Option<String>,
}

/// Snapshot of the session a mutation started in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
    generation: u64,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

fn same_repo(a: &BookmarkRecord, b: &BookmarkRecord) -> bool {
    a.id == b.id || a.full_name.eq_ignore_ascii_case(&b.full_name)
}

/// The signed-in user's bookmark list, kept in sync with the document store.
pub struct BookmarkStore {
    remote: Arc<dyn RemoteStore>,
    state: Mutex<StoreState>,
    list_tx: watch::Sender<Vec<BookmarkRecord>>,
}

impl BookmarkStore {
    /// Creates a controller in the `Unauthenticated` phase.
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        let (list_tx, _) = watch::channel(Vec::new());
        Self {
            remote,
            state: Mutex::new(StoreState {
                user_id: None,
                phase: SessionPhase::Unauthenticated,
                generation: 0,
                bookmarks: Vec::new(),
                load_error: None,
            }),
            list_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &StoreState) {
        self.list_tx.send_replace(state.bookmarks.clone());
    }

    /// The signed-in user and identity generation, or `None` when signed out.
    pub fn session(&self) -> Option<Session> {
        let state = self.lock();
        state.user_id.as_ref().map(|user_id| Session {
            user_id: user_id.clone(),
            generation: state.generation,
        })
    }

    /// Runs `f` on the list if the session is still current, then republishes.
    fn apply<R>(
        &self,
        session: &Session,
        f: impl FnOnce(&mut Vec<BookmarkRecord>) -> R,
    ) -> Result<R, BookmarkError> {
        let mut state = self.lock();
        if state.generation != session.generation {
            return Err(BookmarkError::IdentityChanged);
        }
        let result = f(&mut state.bookmarks);
        self.publish(&state);
        Ok(result)
    }

    /// True while no identity change happened since `session` was taken.
    pub fn is_current(&self, session: &Session) -> bool {
        self.lock().generation == session.generation
    }

    /// Switches to `user_id` and loads that user's collection.
    ///
    /// `None` signs out: the list is emptied and mutations become no-ops.
    /// A fetch that finishes after a newer identity change is discarded.
    pub async fn sync_identity(&self, user_id: Option<String>) -> Result<(), BookmarkError> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.user_id = user_id.clone();
            state.bookmarks.clear();
            state.load_error = None;
            state.phase = if user_id.is_some() {
                SessionPhase::Loading
            } else {
                SessionPhase::Unauthenticated
            };
            self.publish(&state);
            state.generation
        };

        let Some(user_id) = user_id else {
            tracing::info!("bookmark session cleared");
            return Ok(());
        };

        let fetched = self.remote.list(&user_id).await;

        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(user = %user_id, "discarding stale bookmark fetch");
            return Ok(());
        }
        state.phase = SessionPhase::Ready;
        match fetched {
            Ok(bookmarks) => {
                tracing::info!(user = %user_id, count = bookmarks.len(), "bookmarks loaded");
                state.bookmarks = bookmarks;
                self.publish(&state);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user = %user_id, error = %e, "failed to load bookmarks");
                state.load_error = Some(e.to_string());
                self.publish(&state);
                Err(e.into())
            }
        }
    }

    /// Follows `identity`, reloading the list on every change.
    ///
    /// The current value is synced first. The task ends when the identity
    /// sender is dropped.
    pub fn watch_identity(
        self: &Arc<Self>,
        mut identity: watch::Receiver<Option<String>>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let user_id = identity.borrow_and_update().clone();
                if let Err(e) = store.sync_identity(user_id).await {
                    tracing::warn!(error = %e, "identity sync failed");
                }
                if identity.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Bookmarks `repo` for the signed-in user.
    ///
    /// A single conditional create is issued; nothing is appended locally
    /// unless the document was written or already existed remotely.
    pub async fn add_bookmark(&self, repo: &Repository) -> Result<AddOutcome, BookmarkError> {
        let Some(session) = self.session() else {
            return Ok(AddOutcome::Ignored);
        };

        let record = BookmarkRecord::from_repository(repo, now_millis());
        if self.contains(&record.id, &record.full_name) {
            return Ok(AddOutcome::AlreadyBookmarked);
        }

        let created = self.remote.create_if_absent(&session.user_id, &record).await?;
        if created {
            tracing::info!(user = %session.user_id, repo = %record.full_name, "bookmark added");
            let appended = self.apply(&session, |list| {
                if list.iter().any(|b| same_repo(b, &record)) {
                    false
                } else {
                    list.push(record.clone());
                    true
                }
            })?;
            return Ok(if appended {
                AddOutcome::Added(record)
            } else {
                AddOutcome::AlreadyBookmarked
            });
        }

        // Another session wrote it first: adopt the stored document.
        if let Some(existing) = self.remote.get(&session.user_id, &record.id).await? {
            self.apply(&session, |list| {
                if !list.iter().any(|b| b.id == existing.id) {
                    list.push(existing);
                }
            })?;
        }
        Ok(AddOutcome::AlreadyBookmarked)
    }

    /// Writes `repos` as one multi-document batch and appends the new records.
    ///
    /// Returns the records appended to the list. Repositories already present
    /// locally, or repeated within `repos` by id or name, are not written.
    pub async fn commit_batch(
        &self,
        repos: &[Repository],
    ) -> Result<Vec<BookmarkRecord>, BookmarkError> {
        match self.session() {
            Some(session) => self.commit_batch_in(&session, repos).await,
            None => Ok(Vec::new()),
        }
    }

    /// Like [`BookmarkStore::commit_batch`], but only within `session`.
    ///
    /// Returns `IdentityChanged` without writing anything once the identity
    /// has moved on. Documents are only ever written to `session`'s namespace.
    pub async fn commit_batch_in(
        &self,
        session: &Session,
        repos: &[Repository],
    ) -> Result<Vec<BookmarkRecord>, BookmarkError> {
        if !self.is_current(session) {
            return Err(BookmarkError::IdentityChanged);
        }

        let now = now_millis();
        let mut seen_ids = HashSet::new();
        let mut seen_names = HashSet::new();
        let records: Vec<BookmarkRecord> = repos
            .iter()
            .map(|repo| BookmarkRecord::from_repository(repo, now))
            .filter(|r| {
                seen_ids.insert(r.id.clone())
                    && seen_names.insert(r.full_name.to_lowercase())
                    && !self.contains(&r.id, &r.full_name)
            })
            .collect();
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let created: HashSet<String> = self
            .remote
            .create_many(&session.user_id, &records)
            .await?
            .into_iter()
            .collect();

        let appended = self.apply(session, |list| {
            let mut appended = Vec::new();
            for record in records {
                if !created.contains(&record.id) || list.iter().any(|b| same_repo(b, &record)) {
                    continue;
                }
                list.push(record.clone());
                appended.push(record);
            }
            appended
        })?;
        tracing::info!(user = %session.user_id, count = appended.len(), "bookmark batch committed");
        Ok(appended)
    }

    /// Removes the bookmark `id`. Removing an unknown id is a no-op.
    pub async fn remove_bookmark(&self, id: &str) -> Result<(), BookmarkError> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        self.remote.delete(&session.user_id, id).await?;
        self.apply(&session, |list| list.retain(|b| b.id != id))?;
        tracing::info!(user = %session.user_id, id, "bookmark removed");
        Ok(())
    }

    /// Removes several bookmarks with one batched delete.
    pub async fn remove_bookmarks(&self, ids: &[String]) -> Result<(), BookmarkError> {
        let Some(session) = self.session() else {
            return Ok(());
        };
        if ids.is_empty() {
            return Ok(());
        }
        self.remote.delete_many(&session.user_id, ids).await?;
        self.apply(&session, |list| list.retain(|b| !ids.contains(&b.id)))?;
        Ok(())
    }

    /// Deletes every bookmark of the signed-in user.
    ///
    /// One delete is issued per bookmark and all are awaited. An empty list
    /// never reaches the store. On partial failure the list keeps exactly the
    /// bookmarks whose delete failed and `PartialClear` is returned.
    pub async fn clear_bookmarks(&self) -> Result<usize, BookmarkError> {
        let Some(session) = self.session() else {
            return Ok(0);
        };
        let ids: Vec<String> = self.lock().bookmarks.iter().map(|b| b.id.clone()).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let results = join_all(ids.iter().map(|id| self.remote.delete(&session.user_id, id))).await;
        let deleted: HashSet<&String> = ids
            .iter()
            .zip(&results)
            .filter(|(_, r)| r.is_ok())
            .map(|(id, _)| id)
            .collect();
        let failed = ids.len() - deleted.len();

        self.apply(&session, |list| list.retain(|b| !deleted.contains(&b.id)))?;

        if failed > 0 {
            tracing::warn!(
                user = %session.user_id,
                failed,
                total = ids.len(),
                "clear bookmarks partially failed"
            );
            return Err(BookmarkError::PartialClear {
                failed,
                total: ids.len(),
            });
        }
        tracing::info!(user = %session.user_id, count = ids.len(), "bookmarks cleared");
        Ok(ids.len())
    }

    /// Asks the store whether `id` is bookmarked, bypassing the local list.
    pub async fn is_bookmarked_remotely(&self, id: &str) -> Result<bool, BookmarkError> {
        match self.session() {
            Some(session) => Ok(self.remote.exists(&session.user_id, id).await?),
            None => Ok(false),
        }
    }

    /// Snapshot of the list in insertion order.
    pub fn bookmarks(&self) -> Vec<BookmarkRecord> {
        self.lock().bookmarks.clone()
    }

    /// Receiver that observes every list change.
    pub fn subscribe(&self) -> watch::Receiver<Vec<BookmarkRecord>> {
        self.list_tx.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn current_user(&self) -> Option<String> {
        self.lock().user_id.clone()
    }

    /// Error of the last fetch for the current user. Cleared on identity change.
    pub fn load_error(&self) -> Option<String> {
        self.lock().load_error.clone()
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.lock().bookmarks.iter().any(|b| b.id == id)
    }

    fn contains(&self, id: &str, full_name: &str) -> bool {
        self.lock()
            .bookmarks
            .iter()
            .any(|b| b.id == id || b.full_name.eq_ignore_ascii_case(full_name))
    }
}
