//! Drivers module for remote ontology sources
//!
//! Provides the collaborator traits the workspace depends on and their implementations:
//! - GitHubDriver: source control over the GitHub REST API
//! - HttpDriver: plain GET for any other URL
//! - OAuthProxyDriver: OAuth code exchange and refresh through a token proxy
//! - RemoteSources: GitHub and HTTP behind one handle

mod traits;
mod github;
mod http;
mod oauth;

pub use traits::{AuthProvider, CommitRequest, HttpFetcher, SourceControl, SourceLocator, TokenSet};
pub use github::{GitHubDriver, DEFAULT_API_URL, DEFAULT_USER_AGENT};
pub use http::HttpDriver;
pub use oauth::OAuthProxyDriver;

use crate::errors::Result;

/// Source control plus plain HTTP, the collaborator set a workspace needs
#[derive(Debug, Clone)]
pub struct RemoteSources {
    pub github: GitHubDriver,
    pub http: HttpDriver,
}

impl RemoteSources {
    pub fn new(api_url: &str, user_agent: &str, token: Option<String>) -> Result<Self> {
        Ok(Self {
            github: GitHubDriver::new(api_url, user_agent, token)?,
            http: HttpDriver::new(user_agent)?,
        })
    }
}

impl SourceControl for RemoteSources {
    async fn get_file_content(&self, owner: &str, repo: &str, path: &str, reference: &str) -> Result<String> {
        self.github.get_file_content(owner, repo, path, reference).await
    }

    async fn commit_file(&self, request: CommitRequest<'_>) -> Result<String> {
        self.github.commit_file(request).await
    }

    async fn get_latest_revision_id(&self, owner: &str, repo: &str, path: &str, reference: &str) -> Result<String> {
        self.github.get_latest_revision_id(owner, repo, path, reference).await
    }
}

impl HttpFetcher for RemoteSources {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.http.get_text(url).await
    }
}
