//! GitHub REST client for repomark.
//!
//! Resolves `owner/name` identifiers to repository records and serves the
//! user/repository searches behind the suggestion box.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::types::errors::GitHubError;
use crate::types::github::{GitHubUser, Repository, SearchResponse};
use crate::types::settings::GitHubSettings;

/// Resolves a repository by its `owner/name` identifier.
#[async_trait]
pub trait RepoLookup: Send + Sync {
    async fn lookup_repo(&self, full_name: &str) -> Result<Repository, GitHubError>;
}

/// Splits `owner/name`, rejecting anything but exactly one separator with
/// non-empty sides.
pub fn parse_full_name(input: &str) -> Result<(&str, &str), GitHubError> {
    let mut parts = input.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.trim().is_empty() && !name.trim().is_empty() => {
            Ok((owner.trim(), name.trim()))
        }
        _ => Err(GitHubError::InvalidRepoName(input.to_string())),
    }
}

/// Resolves the token to send: the configured one, else `GITHUB_TOKEN`.
pub fn resolve_token(configured: Option<&str>) -> Option<String> {
    configured
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
}

/// GitHub API client.
pub struct GitHubClient {
    client: Client,
    base_url: String,
    user_agent: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Builds a client from settings. The token is resolved once here.
    pub fn new(settings: &GitHubSettings) -> Result<Self, GitHubError> {
        let client = Client::builder().build()?;
        let github = Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            user_agent: settings.user_agent.clone(),
            token: resolve_token(settings.token.as_deref()),
        };
        tracing::debug!(
            base_url = %github.base_url,
            authenticated = github.has_token(),
            "github client ready"
        );
        Ok(github)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, GitHubError> {
        let response = req.send().await?;
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api { status, message });
        }

        Ok(response.json().await?)
    }

    /// URL of `GET /repos/{owner}/{name}`.
    pub fn repo_url(&self, owner: &str, name: &str) -> String {
        format!("{}/repos/{}/{}", self.base_url, owner, name)
    }

    /// Searches users matching `query`.
    pub async fn search_users(
        &self,
        query: &str,
        per_page: u32,
    ) -> Result<Vec<GitHubUser>, GitHubError> {
        let url = format!("{}/search/users", self.base_url);
        let per_page = per_page.to_string();
        let req = self.get(&url).query(&[("q", query), ("per_page", per_page.as_str())]);
        let page: SearchResponse<GitHubUser> = self.send_json(req).await?;
        Ok(page.items)
    }

    /// Searches repositories matching `query`.
    pub async fn search_repositories(
        &self,
        query: &str,
        per_page: u32,
    ) -> Result<Vec<Repository>, GitHubError> {
        let url = format!("{}/search/repositories", self.base_url);
        let per_page = per_page.to_string();
        let req = self.get(&url).query(&[("q", query), ("per_page", per_page.as_str())]);
        let page: SearchResponse<Repository> = self.send_json(req).await?;
        Ok(page.items)
    }

    /// Public repositories of `username`, most recently updated first.
    pub async fn list_user_repos(&self, username: &str) -> Result<Vec<Repository>, GitHubError> {
        let url = format!("{}/users/{}/repos", self.base_url, username.trim());
        let req = self.get(&url).query(&[("per_page", "100"), ("sort", "updated")]);
        self.send_json(req).await
    }
}

#[async_trait]
impl RepoLookup for GitHubClient {
    async fn lookup_repo(&self, full_name: &str) -> Result<Repository, GitHubError> {
        let (owner, name) = parse_full_name(full_name)?;
        let url = self.repo_url(owner, name);
        tracing::debug!(%url, "looking up repository");
        self.send_json(self.get(&url)).await
    }
}
