//! App Core for repomark.
//!
//! Central struct wiring the identity handle, the bookmark store, the CSV
//! importer and the GitHub services together, plus the event channel the RPC
//! server forwards to its client.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::database::connection::Database;
use crate::database::document_store::{RemoteStore, SqliteDocumentStore};
use crate::managers::bookmark_store::BookmarkStore;
use crate::managers::identity::{Identity, IdentityTrait};
use crate::services::activity::bookmark_activity;
use crate::services::csv_importer::CsvImporter;
use crate::services::github_client::{parse_full_name, GitHubClient, RepoLookup};
use crate::services::search::SuggestionSearch;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::activity::ActivityPoint;
use crate::types::bookmark::{AddOutcome, BookmarkRecord, SessionPhase};
use crate::types::errors::{AppError, BookmarkError, ImportError, SettingsError};
use crate::types::github::Repository;
use crate::types::import::{ImportEvent, ImportSummary};
use crate::types::settings::AppSettings;

/// How long sign-in waits for the first bookmark fetch.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

const EVENT_CAPACITY: usize = 256;

/// Unsolicited notification for RPC clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// The bookmark list changed.
    Bookmarks {
        user_id: Option<String>,
        bookmarks: Vec<BookmarkRecord>,
    },
    /// Progress or completion of a background import.
    Import(ImportEvent),
    /// A background import ended with a run-level error.
    ImportFailed { error: String },
}

/// What a background import reads from.
#[derive(Debug, Clone)]
pub enum ImportSource {
    File(PathBuf),
    Text(String),
}

/// Central application struct holding all managers and services.
pub struct App {
    pub identity: Identity,
    pub store: Arc<BookmarkStore>,
    pub github: Arc<GitHubClient>,
    pub lookup: Arc<dyn RepoLookup>,
    pub importer: Arc<CsvImporter>,
    pub search: SuggestionSearch,
    settings_engine: Mutex<SettingsEngine>,
    events: broadcast::Sender<AppEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Opens the database named by the settings and talks to the real GitHub API.
    ///
    /// Must be called inside a tokio runtime.
    pub fn open(settings_engine: SettingsEngine) -> Result<Self, AppError> {
        let settings = settings_engine.effective_settings();
        let db_path = settings_engine.database_path();
        tracing::info!(path = %db_path.display(), "opening bookmark database");
        let db = Arc::new(Database::open(&db_path)?);
        let remote: Arc<dyn RemoteStore> = Arc::new(SqliteDocumentStore::new(db));
        let github = Arc::new(GitHubClient::new(&settings.github)?);
        let lookup: Arc<dyn RepoLookup> = github.clone();
        Ok(Self::assemble(settings_engine, settings, remote, github, lookup))
    }

    /// Like [`App::open`] but with a caller-supplied document store and
    /// repository lookup.
    pub fn with_backends(
        settings_engine: SettingsEngine,
        remote: Arc<dyn RemoteStore>,
        lookup: Arc<dyn RepoLookup>,
    ) -> Result<Self, AppError> {
        let settings = settings_engine.effective_settings();
        let github = Arc::new(GitHubClient::new(&settings.github)?);
        Ok(Self::assemble(settings_engine, settings, remote, github, lookup))
    }

    fn assemble(
        settings_engine: SettingsEngine,
        settings: AppSettings,
        remote: Arc<dyn RemoteStore>,
        github: Arc<GitHubClient>,
        lookup: Arc<dyn RepoLookup>,
    ) -> Self {
        let store = Arc::new(BookmarkStore::new(remote));
        let identity = Identity::new();
        let importer = Arc::new(CsvImporter::new(lookup.clone(), store.clone(), &settings.import));
        let search = SuggestionSearch::new(github.clone(), settings.github.search_per_page);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let tasks = vec![
            store.watch_identity(identity.subscribe()),
            forward_bookmarks(store.clone(), events.clone()),
        ];

        Self {
            identity,
            store,
            github,
            lookup,
            importer,
            search,
            settings_engine: Mutex::new(settings_engine),
            events,
            tasks,
        }
    }

    fn settings_engine(&self) -> MutexGuard<'_, SettingsEngine> {
        self.settings_engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Receiver for bookmark-list and import notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    /// Signs `user_id` in and waits until their bookmarks are loaded.
    ///
    /// A failed fetch is returned as `BookmarkError::LoadFailed`; the user
    /// stays signed in with an empty list.
    pub async fn sign_in(&self, user_id: &str) -> Result<SessionPhase, AppError> {
        let mut list_rx = self.store.subscribe();
        self.identity.sign_in(user_id);
        let phase = self.settle(&mut list_rx, Some(user_id)).await;
        match self.store.load_error() {
            Some(error) => Err(BookmarkError::LoadFailed(error).into()),
            None => Ok(phase),
        }
    }

    /// Signs out and waits until the list is emptied.
    pub async fn sign_out(&self) -> SessionPhase {
        let mut list_rx = self.store.subscribe();
        self.identity.sign_out();
        self.settle(&mut list_rx, None).await
    }

    async fn settle(
        &self,
        list_rx: &mut watch::Receiver<Vec<BookmarkRecord>>,
        expected: Option<&str>,
    ) -> SessionPhase {
        let wait = async {
            loop {
                if self.store.current_user().as_deref() == expected
                    && self.store.phase() != SessionPhase::Loading
                {
                    break;
                }
                if list_rx.changed().await.is_err() {
                    break;
                }
            }
        };
        if tokio::time::timeout(SETTLE_TIMEOUT, wait).await.is_err() {
            tracing::warn!(user = ?expected, "timed out waiting for bookmark sync");
        }
        self.store.phase()
    }

    /// Resolves `owner/name` on GitHub and bookmarks it.
    pub async fn add_by_name(&self, full_name: &str) -> Result<AddOutcome, AppError> {
        let full_name = full_name.trim();
        parse_full_name(full_name)?;
        let repo = self.lookup.lookup_repo(full_name).await?;
        Ok(self.store.add_bookmark(&repo).await?)
    }

    /// Bookmarks an already resolved repository.
    pub async fn add_repository(&self, repo: &Repository) -> Result<AddOutcome, AppError> {
        Ok(self.store.add_bookmark(repo).await?)
    }

    /// Deletes every bookmark and forgets the last import summary.
    pub async fn clear_bookmarks(&self) -> Result<usize, AppError> {
        let cleared = self.store.clear_bookmarks().await?;
        self.importer.clear_summary();
        Ok(cleared)
    }

    pub fn activity(&self) -> Vec<ActivityPoint> {
        bookmark_activity(&self.store.bookmarks())
    }

    /// Starts an import in the background, reporting through [`AppEvent`]s.
    ///
    /// Run-level problems that can be seen up front are returned here; the
    /// importer still enforces them when the task starts.
    pub fn start_import(
        &self,
        source: ImportSource,
    ) -> Result<JoinHandle<Result<ImportSummary, ImportError>>, ImportError> {
        if let ImportSource::File(path) = &source {
            self.importer.check_file_type(path)?;
        }
        if self.store.current_user().is_none() {
            return Err(ImportError::NotAuthenticated);
        }
        if self.importer.is_importing() {
            return Err(ImportError::AlreadyRunning);
        }

        let importer = self.importer.clone();
        let events = self.events.clone();
        Ok(tokio::spawn(async move {
            let progress = events.clone();
            let on_event = move |event: ImportEvent| {
                let _ = progress.send(AppEvent::Import(event));
            };
            let result = match &source {
                ImportSource::File(path) => importer.import_file(path, on_event).await,
                ImportSource::Text(text) => importer.import_text(text, on_event).await,
            };
            if let Err(e) = &result {
                tracing::warn!(error = %e, "background import failed");
                let _ = events.send(AppEvent::ImportFailed {
                    error: e.to_string(),
                });
            }
            result
        }))
    }

    pub async fn user_repos(&self, username: &str) -> Result<Vec<Repository>, AppError> {
        Ok(self.github.list_user_repos(username).await?)
    }

    /// Persisted settings with environment overrides applied.
    pub fn settings(&self) -> AppSettings {
        self.settings_engine().effective_settings()
    }

    /// Updates one setting by dot path. Running services keep their
    /// configuration until the next start.
    pub fn set_setting(&self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        self.settings_engine().set_value(key, value)
    }

    /// Stops the background tasks. Also done on drop.
    pub fn shutdown(&self) {
        self.importer.cancel();
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn forward_bookmarks(
    store: Arc<BookmarkStore>,
    events: broadcast::Sender<AppEvent>,
) -> JoinHandle<()> {
    let mut list_rx = store.subscribe();
    tokio::spawn(async move {
        while list_rx.changed().await.is_ok() {
            let bookmarks = list_rx.borrow_and_update().clone();
            let _ = events.send(AppEvent::Bookmarks {
                user_id: store.current_user(),
                bookmarks,
            });
        }
    })
}
