//! Collaborator traits for fetching and committing ontology sources
//!
//! Defines the abstract interfaces the workspace talks to.
//! Implementations include:
//! - GitHubDriver (source control over the GitHub REST API)
//! - HttpDriver (plain GET for any other URL)
//! - OAuthProxyDriver (token exchange through the OAuth proxy)

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::errors::{OntoError, Result};

/// Where an ontology source lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// File inside a source-control repository
    SourceControl {
        owner: String,
        repo: String,
        reference: String,
        path: String,
    },

    /// Anything else, fetched with a plain GET
    Http { url: String },
}

impl SourceLocator {
    /// Classify a user-supplied URL
    ///
    /// `https://github.com/{owner}/{repo}/blob/{ref}/{path...}` is a source-control
    /// file (`ref` defaults to `main`); every other URL is fetched over HTTP.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let parts: Vec<&str> = url.split('/').collect();
        if parts.len() < 3 || !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(OntoError::InvalidIri(format!("not an http(s) URL: {}", url)));
        }

        if parts[2] != "github.com" {
            return Ok(SourceLocator::Http { url: url.to_string() });
        }

        let owner = parts.get(3).copied().unwrap_or_default();
        let repo = parts.get(4).copied().unwrap_or_default();
        let reference = parts.get(6).copied().filter(|r| !r.is_empty()).unwrap_or("main");
        let path = parts.get(7..).map(|p| p.join("/")).unwrap_or_default();
        if owner.is_empty() || repo.is_empty() || path.is_empty() {
            return Err(OntoError::InvalidIri(format!(
                "expected https://github.com/{{owner}}/{{repo}}/blob/{{ref}}/{{path}}, got {}",
                url
            )));
        }

        Ok(SourceLocator::SourceControl {
            owner: owner.to_string(),
            repo: repo.to_string(),
            reference: reference.to_string(),
            path: path.to_string(),
        })
    }

    pub fn is_source_control(&self) -> bool {
        matches!(self, SourceLocator::SourceControl { .. })
    }
}

/// A file commit through source control
#[derive(Debug, Clone)]
pub struct CommitRequest<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub path: &'a str,
    pub branch: &'a str,
    pub content: &'a str,
    pub message: &'a str,
}

/// Source-control collaborator
///
/// # Semantics
///
/// - Revision identifiers are opaque; equal ids mean unchanged content
/// - Network errors surface as `NetworkFailure`, never retried here
pub trait SourceControl: Send + Sync {
    /// Read a file at `reference` (branch, tag or commit)
    fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Create or update a file on a branch
    ///
    /// # Returns
    ///
    /// Revision identifier of the new commit
    fn commit_file(&self, request: CommitRequest<'_>) -> impl Future<Output = Result<String>> + Send;

    /// Latest revision identifier touching `path` at `reference`
    fn get_latest_revision_id(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Plain HTTP collaborator
pub trait HttpFetcher: Send + Sync {
    fn get_text(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Tokens returned by an OAuth exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// OAuth collaborator
pub trait AuthProvider: Send + Sync {
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<TokenSet>> + Send;
    fn refresh_token(&self, refresh_token: &str) -> impl Future<Output = Result<TokenSet>> + Send;
}
