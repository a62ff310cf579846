//! GitHubDriver - source control over the GitHub REST API
//!
//! Reads raw file contents, resolves the latest commit touching a path and
//! commits updated files through the contents endpoint.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::traits::{CommitRequest, SourceControl};
use crate::errors::{OntoError, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = concat!("ontoview/", env!("CARGO_PKG_VERSION"));

const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct ContentMeta {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutContentResponse {
    commit: CommitRef,
}

/// GitHub REST client
#[derive(Debug, Clone)]
pub struct GitHubDriver {
    api_url: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl GitHubDriver {
    pub fn new(api_url: &str, user_agent: &str, token: Option<String>) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| OntoError::Config(format!("invalid GitHub API URL {}: {}", api_url, e)))?;
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { api_url, http, token })
    }

    /// Replace the bearer token used for subsequent requests
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| OntoError::Config(format!("GitHub API URL cannot be a base: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> Result<Url> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        self.endpoint(&segments)
    }

    fn add_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref token) = self.token {
            req.bearer_auth(token)
        } else {
            req
        }
    }

    async fn fail(resp: reqwest::Response, what: &str) -> OntoError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                OntoError::Auth(format!("{} rejected with status {}: {}", what, status, body.trim()))
            }
            _ => OntoError::NetworkFailure(format!("{} failed with status {}: {}", what, status, body.trim())),
        }
    }

    /// Blob sha of an existing file, `None` when the file does not exist yet
    async fn existing_sha(&self, owner: &str, repo: &str, path: &str, branch: &str) -> Result<Option<String>> {
        let url = self.contents_url(owner, repo, path)?;
        let resp = self
            .add_auth(self.http.get(url))
            .query(&[("ref", branch)])
            .header(reqwest::header::ACCEPT, JSON_MEDIA_TYPE)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let meta: ContentMeta = resp.json().await?;
                Ok(Some(meta.sha))
            }
            _ => Err(Self::fail(resp, "content lookup").await),
        }
    }
}

impl SourceControl for GitHubDriver {
    async fn get_file_content(&self, owner: &str, repo: &str, path: &str, reference: &str) -> Result<String> {
        let url = self.contents_url(owner, repo, path)?;
        debug!(owner, repo, path, reference, "fetching file content");
        let resp = self
            .add_auth(self.http.get(url))
            .query(&[("ref", reference)])
            .header(reqwest::header::ACCEPT, RAW_MEDIA_TYPE)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp, &format!("fetch of {}/{}/{}", owner, repo, path)).await);
        }
        Ok(resp.text().await?)
    }

    async fn commit_file(&self, request: CommitRequest<'_>) -> Result<String> {
        let sha = self
            .existing_sha(request.owner, request.repo, request.path, request.branch)
            .await?;

        let mut body = json!({
            "message": request.message,
            "content": STANDARD.encode(request.content.as_bytes()),
            "branch": request.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let url = self.contents_url(request.owner, request.repo, request.path)?;
        debug!(owner = request.owner, repo = request.repo, path = request.path, "committing file");
        let resp = self
            .add_auth(self.http.put(url))
            .header(reqwest::header::ACCEPT, JSON_MEDIA_TYPE)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp, "commit").await);
        }
        let created: PutContentResponse = resp.json().await?;
        Ok(created.commit.sha)
    }

    async fn get_latest_revision_id(&self, owner: &str, repo: &str, path: &str, reference: &str) -> Result<String> {
        let url = self.endpoint(&["repos", owner, repo, "commits"])?;
        let resp = self
            .add_auth(self.http.get(url))
            .query(&[("path", path), ("sha", reference), ("per_page", "1")])
            .header(reqwest::header::ACCEPT, JSON_MEDIA_TYPE)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::fail(resp, "revision lookup").await);
        }
        let commits: Vec<CommitRef> = resp.json().await?;
        commits
            .into_iter()
            .next()
            .map(|c| c.sha)
            .ok_or_else(|| OntoError::SourceNotFound(format!("no commits for {}/{}/{}@{}", owner, repo, path, reference)))
    }
}
