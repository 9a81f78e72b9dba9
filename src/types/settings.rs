use serde::{Deserialize, Serialize};

/// Top-level application settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub github: GitHubSettings,
    #[serde(default)]
    pub import: ImportSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// GitHub REST API access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitHubSettings {
    pub api_base_url: String,
    /// Personal access token; `GITHUB_TOKEN` overrides it when set.
    pub token: Option<String>,
    pub user_agent: String,
    /// Results per kind for search suggestions.
    pub search_per_page: u32,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            token: None,
            user_agent: format!("repomark/{}", env!("CARGO_PKG_VERSION")),
            search_per_page: 5,
        }
    }
}

/// Pacing of the batched CSV importer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportSettings {
    /// Candidates looked up per batch. Must be at least 1.
    pub batch_size: usize,
    /// Pause between batches, in milliseconds.
    pub batch_delay_ms: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_delay_ms: 800,
        }
    }
}

/// Location of the bookmark database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StorageSettings {
    /// Explicit database file; defaults to `repomark.db` in the platform data dir.
    pub database_path: Option<String>,
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
