//! Batched CSV importer for repomark.
//!
//! Reads a newline-delimited list of `owner/name` identifiers, resolves each
//! one through a [`RepoLookup`], drops duplicates, and commits the survivors
//! to the [`BookmarkStore`] one batch at a time with a fixed pause between
//! batches. Per-line failures only ever increase the skipped counter.
//!
//! A run belongs to the user who started it. When the identity changes
//! mid-run, nothing more is written and the run ends as cancelled.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::managers::bookmark_store::{BookmarkStore, Session};
use crate::services::github_client::{parse_full_name, RepoLookup};
use crate::types::bookmark::BookmarkRecord;
use crate::types::errors::{BookmarkError, ImportError};
use crate::types::github::Repository;
use crate::types::import::{ImportEvent, ImportSummary, ImporterStatus};
use crate::types::settings::ImportSettings;

/// Splits raw file text into candidate identifiers: one per non-blank line, trimmed.
pub fn parse_candidates(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when `path` names a `.csv` file.
pub fn is_csv_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(".csv"))
        .unwrap_or(false)
}

/// Transient bookkeeping of one import run.
#[derive(Debug, Default)]
pub struct ImportBatchState {
    /// Index of the next unprocessed candidate.
    pub cursor: usize,
    pub imported: usize,
    pub skipped: usize,
    known_ids: HashSet<u64>,
    /// Lowercased `owner/name` values.
    known_full_names: HashSet<String>,
}

impl ImportBatchState {
    /// Seeds the known sets from the current bookmark list.
    pub fn seed(bookmarks: &[BookmarkRecord]) -> Self {
        let mut state = Self::default();
        for bookmark in bookmarks {
            if let Ok(id) = bookmark.id.parse::<u64>() {
                state.known_ids.insert(id);
            }
            state.known_full_names.insert(bookmark.full_name.to_lowercase());
        }
        state
    }

    pub fn is_known_name(&self, full_name: &str) -> bool {
        self.known_full_names.contains(&full_name.to_lowercase())
    }

    pub fn is_known_id(&self, id: u64) -> bool {
        self.known_ids.contains(&id)
    }

    /// Marks `repo` (and the identifier it was requested as) as known.
    pub fn remember(&mut self, candidate: &str, repo: &Repository) {
        self.known_ids.insert(repo.id);
        self.known_full_names.insert(repo.full_name.to_lowercase());
        self.known_full_names.insert(candidate.to_lowercase());
    }

    fn summary(&self, cancelled: bool) -> ImportSummary {
        ImportSummary {
            imported: self.imported,
            skipped: self.skipped,
            cancelled,
        }
    }
}

/// Resets the importer's status when a run ends, however it ends.
struct RunGuard<'a> {
    importer: &'a CsvImporter,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut status = self.importer.lock_status();
        status.importing = false;
        status.selected_file = None;
        *self
            .importer
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

/// Imports bookmark lists into a [`BookmarkStore`].
pub struct CsvImporter {
    lookup: Arc<dyn RepoLookup>,
    store: Arc<BookmarkStore>,
    batch_size: usize,
    batch_delay: Duration,
    status: Mutex<ImporterStatus>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl CsvImporter {
    pub fn new(
        lookup: Arc<dyn RepoLookup>,
        store: Arc<BookmarkStore>,
        settings: &ImportSettings,
    ) -> Self {
        Self {
            lookup,
            store,
            batch_size: settings.batch_size.max(1),
            batch_delay: Duration::from_millis(settings.batch_delay_ms),
            status: Mutex::new(ImporterStatus::default()),
            cancel: Mutex::new(None),
        }
    }

    fn lock_status(&self) -> MutexGuard<'_, ImporterStatus> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> ImporterStatus {
        self.lock_status().clone()
    }

    pub fn is_importing(&self) -> bool {
        self.lock_status().importing
    }

    /// Forgets the last summary, e.g. after all bookmarks were cleared.
    pub fn clear_summary(&self) {
        self.lock_status().summary = None;
    }

    /// Requests the running import to stop before its next batch.
    /// Returns false when nothing is running.
    pub fn cancel(&self) -> bool {
        match self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Records `error` as the status error and hands it back.
    fn fail(&self, error: ImportError) -> ImportError {
        self.lock_status().error = Some(error.to_string());
        error
    }

    /// Rejects `path` unless it names a `.csv` file, recording the error.
    pub(crate) fn check_file_type(&self, path: &Path) -> Result<(), ImportError> {
        if is_csv_file(path) {
            Ok(())
        } else {
            Err(self.fail(ImportError::UnsupportedFileType(path.display().to_string())))
        }
    }

    fn begin(
        &self,
        selected_file: Option<String>,
    ) -> Result<(RunGuard<'_>, CancellationToken, Session), ImportError> {
        let Some(session) = self.store.session() else {
            return Err(self.fail(ImportError::NotAuthenticated));
        };
        let mut status = self.lock_status();
        if status.importing {
            drop(status);
            return Err(ImportError::AlreadyRunning);
        }
        status.importing = true;
        status.selected_file = selected_file;
        status.summary = None;
        status.error = None;
        drop(status);

        let token = CancellationToken::new();
        *self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.clone());
        Ok((RunGuard { importer: self }, token, session))
    }

    /// Imports the `.csv` file at `path`.
    ///
    /// A wrong file type is rejected before anything else and leaves the
    /// previous summary in place. An unreadable file aborts before the first
    /// batch.
    pub async fn import_file<F>(
        &self,
        path: &Path,
        on_event: F,
    ) -> Result<ImportSummary, ImportError>
    where
        F: FnMut(ImportEvent) + Send,
    {
        self.check_file_type(path)?;
        let (guard, token, session) = self.begin(Some(path.display().to_string()))?;

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read import file");
                return Err(self.fail(ImportError::FileRead(e)));
            }
        };

        let summary = self.run(parse_candidates(&text), session, token, on_event).await;
        drop(guard);
        Ok(summary)
    }

    /// Imports identifiers from already-loaded text.
    pub async fn import_text<F>(
        &self,
        text: &str,
        on_event: F,
    ) -> Result<ImportSummary, ImportError>
    where
        F: FnMut(ImportEvent) + Send,
    {
        let (guard, token, session) = self.begin(None)?;
        let summary = self.run(parse_candidates(text), session, token, on_event).await;
        drop(guard);
        Ok(summary)
    }

    async fn run<F>(
        &self,
        candidates: Vec<String>,
        session: Session,
        cancel: CancellationToken,
        on_event: F,
    ) -> ImportSummary
    where
        F: FnMut(ImportEvent) + Send,
    {
        let span = tracing::info_span!(
            "csv_import",
            run_id = %Uuid::new_v4(),
            user = %session.user_id(),
            total = candidates.len()
        );
        self.run_batches(candidates, &session, cancel, on_event)
            .instrument(span)
            .await
    }

    async fn run_batches<F>(
        &self,
        candidates: Vec<String>,
        session: &Session,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> ImportSummary
    where
        F: FnMut(ImportEvent) + Send,
    {
        let total = candidates.len();
        let mut state = ImportBatchState::seed(&self.store.bookmarks());
        let mut cancelled = false;

        while state.cursor < total {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if !self.store.is_current(session) {
                tracing::warn!("signed-in user changed, stopping import");
                cancelled = true;
                break;
            }

            let end = (state.cursor + self.batch_size).min(total);
            let mut resolved = Vec::new();
            for candidate in &candidates[state.cursor..end] {
                if let Some(repo) = self.resolve(candidate, &mut state).await {
                    resolved.push(repo);
                }
            }
            state.cursor = end;

            if !resolved.is_empty() {
                match self.store.commit_batch_in(session, &resolved).await {
                    Ok(appended) => {
                        state.imported += appended.len();
                        state.skipped += resolved.len() - appended.len();
                    }
                    Err(BookmarkError::IdentityChanged) => {
                        tracing::warn!(
                            count = resolved.len(),
                            "signed-in user changed, stopping import"
                        );
                        state.skipped += resolved.len();
                        cancelled = true;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, count = resolved.len(), "batch commit failed");
                        state.skipped += resolved.len();
                    }
                }
            }

            let summary = state.summary(false);
            let message = summary.progress_message();
            tracing::info!(
                processed = end,
                total,
                imported = summary.imported,
                skipped = summary.skipped,
                "import batch done"
            );
            self.lock_status().summary = Some(message.clone());
            on_event(ImportEvent::Progress {
                processed: end,
                total,
                summary,
                message,
            });

            if state.cursor < total {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.batch_delay) => {}
                }
            }
        }

        let summary = state.summary(cancelled);
        let message = summary.to_string();
        tracing::info!(
            imported = summary.imported,
            skipped = summary.skipped,
            cancelled,
            "import finished"
        );
        self.lock_status().summary = Some(message.clone());
        on_event(ImportEvent::Finished { summary, message });
        summary
    }

    /// Validates and resolves one candidate, counting it as skipped on any failure.
    async fn resolve(&self, candidate: &str, state: &mut ImportBatchState) -> Option<Repository> {
        if parse_full_name(candidate).is_err() {
            tracing::debug!(candidate, "skipping malformed line");
            state.skipped += 1;
            return None;
        }
        if state.is_known_name(candidate) {
            tracing::debug!(candidate, "skipping known repository");
            state.skipped += 1;
            return None;
        }

        match self.lookup.lookup_repo(candidate).await {
            Ok(repo) if state.is_known_id(repo.id) => {
                tracing::debug!(candidate, id = repo.id, "skipping duplicate repository id");
                state.skipped += 1;
                None
            }
            Ok(repo) => {
                state.remember(candidate, &repo);
                Some(repo)
            }
            Err(e) => {
                if e.is_rate_limited() {
                    tracing::warn!(candidate, error = %e, "lookup rate limited");
                } else {
                    tracing::debug!(candidate, error = %e, "lookup failed");
                }
                state.skipped += 1;
                None
            }
        }
    }
}
