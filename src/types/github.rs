use serde::{Deserialize, Serialize};

/// Owner reference nested in a repository payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A GitHub repository as returned by `GET /repos/{owner}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub owner: Option<RepositoryOwner>,
}

impl Repository {
    /// Login of the owning account, from the nested owner or the `owner/name` prefix.
    pub fn owner_login(&self) -> String {
        match &self.owner {
            Some(owner) => owner.login.clone(),
            None => owner_from_full_name(&self.full_name),
        }
    }

    /// Document key used by the bookmark store.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// Returns the part of `owner/name` before the separator.
pub fn owner_from_full_name(full_name: &str) -> String {
    full_name
        .split_once('/')
        .map(|(owner, _)| owner)
        .unwrap_or(full_name)
        .to_string()
}

/// A GitHub user summary from `GET /search/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub html_url: String,
}

/// Envelope of the GitHub search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// One search suggestion shown while the user types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Suggestion {
    User {
        id: u64,
        login: String,
        avatar_url: Option<String>,
        html_url: String,
    },
    Repo {
        id: u64,
        full_name: String,
        description: Option<String>,
        html_url: String,
        owner: Option<String>,
        owner_avatar: Option<String>,
    },
}

impl From<GitHubUser> for Suggestion {
    fn from(user: GitHubUser) -> Self {
        Suggestion::User {
            id: user.id,
            login: user.login,
            avatar_url: user.avatar_url,
            html_url: user.html_url,
        }
    }
}

impl From<Repository> for Suggestion {
    fn from(repo: Repository) -> Self {
        let (owner, owner_avatar) = match repo.owner {
            Some(o) => (Some(o.login), o.avatar_url),
            None => (None, None),
        };
        Suggestion::Repo {
            id: repo.id,
            full_name: repo.full_name,
            description: repo.description,
            html_url: repo.html_url,
            owner,
            owner_avatar,
        }
    }
}
