//! Remote repository host: the seam and a GitHub REST implementation.

use crate::types::{AppError, Result};
use crate::utils::config::Config;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Owner and name of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

impl RepositoryRef {
    /// Parse a repository URL, taking the last two path segments.
    ///
    /// `https://github.com/owner/repo`, `.../owner/repo/` and
    /// `.../owner/repo.git` all parse to `owner/repo`.
    pub fn parse(url: &str) -> Result<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        let without_scheme = trimmed
            .split_once("://")
            .map_or(trimmed, |(_, rest)| rest);
        let mut segments = without_scheme
            .rsplit(['/', ':'])
            .filter(|s| !s.is_empty());

        match (segments.next(), segments.next()) {
            (Some(repo), Some(owner)) => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(AppError::BadRequest(format!(
                "'{}' is not a repository URL of the form .../owner/repo",
                url
            ))),
        }
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Files touched between two commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Added or modified paths
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Commit sha at the tip of `branch`.
    async fn latest_commit(&self, repo: &RepositoryRef, branch: &str) -> Result<String>;

    async fn diff(&self, repo: &RepositoryRef, base: &str, head: &str) -> Result<ChangeSet>;

    /// Raw bytes of `path` at `reference` (branch or sha).
    async fn fetch_file_content(
        &self,
        repo: &RepositoryRef,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>>;

    /// Every file path in the tree at `reference`.
    async fn fetch_full_tree(&self, repo: &RepositoryRef, reference: &str) -> Result<Vec<String>>;
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
}

#[derive(Deserialize)]
struct CompareResponse {
    #[serde(default)]
    files: Vec<CompareFile>,
}

#[derive(Deserialize)]
struct CompareFile {
    filename: String,
    status: String,
    previous_filename: Option<String>,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// GitHub REST API client.
pub struct GitHubClient {
    http: Arc<reqwest::Client>,
    api_base: String,
    raw_base: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        http: Arc<reqwest::Client>,
        api_base: impl Into<String>,
        raw_base: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            raw_base: raw_base.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_config(config: &Config, http: Arc<reqwest::Client>) -> Self {
        Self::new(
            http,
            &config.repository.api_base,
            &config.repository.raw_base,
            config.secrets.repository_token.clone(),
        )
    }

    async fn get(&self, url: String, accept: &str) -> Result<reqwest::Response> {
        let mut request = self.http.get(&url).header("accept", accept);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "GET {} returned {}",
                url, status
            )));
        }
        Ok(response)
    }

    /// Raw content URL with every path segment percent-encoded.
    fn raw_url(&self, repo: &RepositoryRef, reference: &str, path: &str) -> Result<reqwest::Url> {
        let invalid = || {
            AppError::InvalidConfiguration(format!(
                "raw content base '{}' is not a usable URL",
                self.raw_base
            ))
        };
        let mut url = reqwest::Url::parse(&self.raw_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend([repo.owner.as_str(), repo.repo.as_str(), reference])
            .extend(path.split('/'));
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: String) -> Result<T> {
        let response = self.get(url.clone(), "application/vnd.github+json").await?;
        response.json::<T>().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Unexpected response from {}: {}", url, e))
        })
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn latest_commit(&self, repo: &RepositoryRef, branch: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_base, repo.owner, repo.repo, branch
        );
        let commit: CommitResponse = self.get_json(url).await?;
        debug!(repository = %repo, branch, commit = %commit.sha, "Resolved latest commit");
        Ok(commit.sha)
    }

    async fn diff(&self, repo: &RepositoryRef, base: &str, head: &str) -> Result<ChangeSet> {
        let url = format!(
            "{}/repos/{}/{}/compare/{}...{}",
            self.api_base, repo.owner, repo.repo, base, head
        );
        let compare: CompareResponse = self.get_json(url).await?;

        let mut changes = ChangeSet::default();
        for file in compare.files {
            match file.status.as_str() {
                "added" | "modified" | "changed" | "copied" => changes.changed.push(file.filename),
                "removed" => changes.removed.push(file.filename),
                "renamed" => {
                    if let Some(previous) = file.previous_filename {
                        changes.removed.push(previous);
                    }
                    changes.changed.push(file.filename);
                }
                other => debug!(path = %file.filename, status = other, "Ignoring file status"),
            }
        }
        Ok(changes)
    }

    async fn fetch_file_content(
        &self,
        repo: &RepositoryRef,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>> {
        let url = self.raw_url(repo, reference, path)?.to_string();
        let response = self.get(url.clone(), "*/*").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Reading {} failed: {}", url, e)))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_full_tree(&self, repo: &RepositoryRef, reference: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, repo.owner, repo.repo, reference
        );
        let tree: TreeResponse = self.get_json(url).await?;
        if tree.truncated {
            warn!(repository = %repo, "Repository tree listing was truncated");
        }
        Ok(tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| entry.path)
            .collect())
    }
}
