use thiserror::Error;

// === StoreError ===

/// Errors raised by the per-user document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database rejected the operation.
    #[error("Document store database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// A stored document could not be decoded.
    #[error("Corrupt bookmark document {id}: {reason}")]
    CorruptDocument { id: String, reason: String },
    /// The document addressed by a metadata update does not exist.
    #[error("Bookmark document not found: {0}")]
    NotFound(String),
    /// Any other backend failure.
    #[error("Document store unavailable: {0}")]
    Unavailable(String),
}

// === BookmarkError ===

/// Errors related to bookmark list operations.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// A remote read or write failed; local state was left unchanged.
    #[error("Bookmark storage error: {0}")]
    Store(#[from] StoreError),
    /// Some deletes of a clear-all failed; the list keeps only those bookmarks.
    #[error("Failed to clear {failed} of {total} bookmarks")]
    PartialClear { failed: usize, total: usize },
    /// The identity changed while the operation was in flight.
    #[error("Signed-in user changed during the operation")]
    IdentityChanged,
    /// The signed-in user's collection could not be fetched.
    #[error("Failed to load bookmarks: {0}")]
    LoadFailed(String),
}

// === GitHubError ===

/// Errors related to GitHub API calls.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// A transport-level failure occurred while talking to GitHub.
    #[error("GitHub network error: {0}")]
    Network(#[from] reqwest::Error),
    /// GitHub answered with a non-success status.
    #[error("GitHub API error: {message} (status: {status})")]
    Api { status: u16, message: String },
    /// The identifier is not of the form `owner/name`.
    #[error("Invalid repository name: {0}. Expected 'owner/name'")]
    InvalidRepoName(String),
}

impl GitHubError {
    /// True when GitHub refused the request for quota reasons.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GitHubError::Api { status, .. } if *status == 403 || *status == 429)
    }
}

// === ImportError ===

/// Run-level errors of the CSV importer. Per-line failures are never errors.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The selected file does not have a `.csv` name.
    #[error("Please upload a .csv file.")]
    UnsupportedFileType(String),
    /// The selected file could not be read.
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Another import run is still in progress.
    #[error("An import is already in progress")]
    AlreadyRunning,
    /// No user is signed in.
    #[error("Sign in to import bookmarks")]
    NotAuthenticated,
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Errors raised while wiring the application together.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to open database: {0}")]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Failed to build GitHub client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error(transparent)]
    Bookmark(#[from] BookmarkError),
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error(transparent)]
    Import(#[from] ImportError),
}
