//! Suggestion search for repomark.
//!
//! Combines GitHub user and repository search results into a single list of
//! suggestions, users first.

use std::sync::Arc;

use crate::services::github_client::GitHubClient;
use crate::types::errors::GitHubError;
use crate::types::github::{GitHubUser, Repository, Suggestion};

/// Suggestion provider backed by the GitHub search endpoints.
pub struct SuggestionSearch {
    client: Arc<GitHubClient>,
    per_page: u32,
}

impl SuggestionSearch {
    pub fn new(client: Arc<GitHubClient>, per_page: u32) -> Self {
        Self { client, per_page }
    }

    /// Returns user suggestions followed by repository suggestions.
    ///
    /// A blank query returns nothing without contacting GitHub. Both searches
    /// run concurrently and either failing fails the request.
    pub async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, GitHubError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let (users, repos) = tokio::try_join!(
            self.client.search_users(query, self.per_page),
            self.client.search_repositories(query, self.per_page),
        )?;
        Ok(merge_suggestions(users, repos))
    }
}

/// Users first, then repositories, each in API order.
pub fn merge_suggestions(users: Vec<GitHubUser>, repos: Vec<Repository>) -> Vec<Suggestion> {
    users
        .into_iter()
        .map(Suggestion::from)
        .chain(repos.into_iter().map(Suggestion::from))
        .collect()
}

/// Account whose repositories should be listed when `suggestion` is picked.
pub fn username_from_suggestion(suggestion: &Suggestion) -> Option<&str> {
    match suggestion {
        Suggestion::User { login, .. } => Some(login),
        Suggestion::Repo { owner, .. } => owner.as_deref(),
    }
}
