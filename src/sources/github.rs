//! Read-only client for public GitHub repositories.
//!
//! Lists the recursive tree of a branch over the REST API and downloads raw
//! file content in fixed-size batches.

use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::GithubConfig;
use crate::constants::{USER_AGENT, truncate_chars};
use crate::models::{FileDescriptor, SourceFile};

use super::{FileFilter, SourceError};

static REPO_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com[/:]([^/\s]+)/([^/\s?#]+)").unwrap());

/// `owner/repo` parsed from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

/// Parse `https://github.com/owner/repo[.git][/...]`.
pub fn parse_repo_url(url: &str) -> Result<RepoRef, SourceError> {
    let caps = REPO_URL_RE
        .captures(url.trim())
        .ok_or_else(|| SourceError::InvalidUrl(url.to_string()))?;
    let owner = caps[1].to_string();
    let repo = caps[2].trim_end_matches(".git").to_string();
    if repo.is_empty() {
        return Err(SourceError::InvalidUrl(url.to_string()));
    }
    Ok(RepoRef { owner, repo })
}

/// One entry of a recursive git tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Deserialize)]
struct RepoResponse {
    default_branch: Option<String>,
}

pub struct GithubClient {
    http: reqwest::Client,
    config: GithubConfig,
}

impl GithubClient {
    /// GitHub rejects API calls without a User-Agent, so a client that
    /// cannot carry one is an error.
    pub fn new(config: GithubConfig) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn api_get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github.v3+json");
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// The repository's default branch, or `None` when it cannot be read.
    pub async fn default_branch(&self, repo: &RepoRef) -> Option<String> {
        let url = format!(
            "{}/repos/{}/{}",
            self.config.api_base, repo.owner, repo.repo
        );
        let response = match self.api_get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(status = r.status().as_u16(), "repository lookup failed");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "repository lookup failed");
                return None;
            }
        };
        response
            .json::<RepoResponse>()
            .await
            .ok()
            .and_then(|r| r.default_branch)
    }

    /// Recursive tree of `branch`.
    pub async fn tree(&self, repo: &RepoRef, branch: &str) -> Result<Vec<TreeEntry>, SourceError> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{branch}?recursive=1",
            self.config.api_base, repo.owner, repo.repo
        );
        let response = self
            .api_get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SourceError::RepositoryNotFound),
            status if !status.is_success() => Err(SourceError::Api(status.as_u16())),
            _ => {
                let body: TreeResponse = response
                    .json()
                    .await
                    .map_err(|e| SourceError::Transport(e.to_string()))?;
                Ok(body.tree)
            }
        }
    }

    /// Tree of `main`, falling back to `master` when `main` does not exist.
    async fn main_or_master_tree(
        &self,
        repo: &RepoRef,
    ) -> Result<(String, Vec<TreeEntry>), SourceError> {
        match self.tree(repo, "main").await {
            Ok(tree) => Ok(("main".to_string(), tree)),
            Err(SourceError::RepositoryNotFound) => {
                tracing::debug!(repo = %repo.repo, "no main branch, trying master");
                let tree = self.tree(repo, "master").await?;
                Ok(("master".to_string(), tree))
            }
            Err(e) => Err(e),
        }
    }

    /// Download the reviewable code files of a repository.
    ///
    /// At most `max_files` files are fetched, `batch_size` at a time; each
    /// is truncated to `max_file_chars`. Individual failures are skipped.
    pub async fn fetch_repository(&self, url: &str) -> Result<Vec<SourceFile>, SourceError> {
        let repo = parse_repo_url(url)?;
        let (branch, tree) = self.main_or_master_tree(&repo).await?;

        let filter = FileFilter::code();
        let paths: Vec<String> = tree
            .into_iter()
            .filter(|e| e.is_blob() && filter.matches(&e.path))
            .take(self.config.max_files)
            .map(|e| e.path)
            .collect();
        tracing::info!(
            owner = %repo.owner,
            repo = %repo.repo,
            %branch,
            files = paths.len(),
            "fetching repository files"
        );

        let mut files = Vec::with_capacity(paths.len());
        for batch in paths.chunks(self.config.batch_size.max(1)) {
            let fetched = join_all(batch.iter().map(|path| self.fetch_raw(&repo, &branch, path)))
                .await;
            files.extend(fetched.into_iter().flatten());
        }

        if files.is_empty() {
            return Err(SourceError::NoFiles);
        }
        Ok(files)
    }

    async fn fetch_raw(&self, repo: &RepoRef, branch: &str, path: &str) -> Option<SourceFile> {
        let url = format!(
            "{}/{}/{}/{branch}/{path}",
            self.config.raw_base, repo.owner, repo.repo
        );
        let response = match self.http.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!(path, status = r.status().as_u16(), "skipping file");
                return None;
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "skipping file");
                return None;
            }
        };
        let content = response.text().await.ok()?;
        Some(SourceFile {
            path: path.to_string(),
            content: truncate_chars(&content, self.config.max_file_chars).to_string(),
        })
    }

    /// List documentable files on the default branch (`main` if unknown).
    pub async fn list_doc_files(&self, url: &str) -> Result<Vec<FileDescriptor>, SourceError> {
        let repo = parse_repo_url(url)?;
        let branch = self
            .default_branch(&repo)
            .await
            .unwrap_or_else(|| "main".to_string());
        let tree = self.tree(&repo, &branch).await?;

        let filter = FileFilter::docs();
        let files: Vec<FileDescriptor> = tree
            .into_iter()
            .filter(|e| e.is_blob() && filter.matches(&e.path))
            .map(|e| FileDescriptor {
                name: Some(e.path),
                path: None,
                size: e.size,
            })
            .collect();
        tracing::info!(repo = %repo.repo, %branch, files = files.len(), "listed files for docs");
        Ok(files)
    }
}
