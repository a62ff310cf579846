//! OAuthProxyDriver - GitHub OAuth code exchange through a token proxy
//!
//! The proxy holds the client secret. It exposes two form endpoints:
//! - `POST {proxy}/api/github/oauth/token` with `code`
//! - `POST {proxy}/api/github/oauth/refresh-token` with `refresh_token`

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use super::traits::{AuthProvider, TokenSet};
use crate::errors::{OntoError, Result};

/// Proxy reply: either a token set or an OAuth error
#[derive(Debug, Deserialize)]
struct TokenReply {
    access_token: Option<String>,
    token_type: Option<String>,
    scope: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenReply {
    fn into_token_set(self) -> Result<TokenSet> {
        if let Some(error) = self.error {
            let detail = self.error_description.unwrap_or_default();
            return Err(OntoError::Auth(format!("{} {}", error, detail).trim().to_string()));
        }
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OntoError::Auth("proxy reply carries no access_token".to_string()))?;
        Ok(TokenSet {
            access_token,
            token_type: self.token_type,
            scope: self.scope,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_in: self.expires_in,
        })
    }
}

fn parse_token_reply(body: &str) -> Result<TokenSet> {
    let reply: TokenReply = serde_json::from_str(body)?;
    reply.into_token_set()
}

#[derive(Debug, Clone)]
pub struct OAuthProxyDriver {
    proxy_url: Url,
    http: reqwest::Client,
}

impl OAuthProxyDriver {
    pub fn new(proxy_url: &str) -> Result<Self> {
        let proxy_url = Url::parse(proxy_url)
            .map_err(|e| OntoError::Config(format!("invalid OAuth proxy URL {}: {}", proxy_url, e)))?;
        let http = reqwest::Client::builder()
            .user_agent(super::DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { proxy_url, http })
    }

    fn endpoint(&self, last: &str) -> Result<Url> {
        let mut url = self.proxy_url.clone();
        url.path_segments_mut()
            .map_err(|_| OntoError::Config(format!("OAuth proxy URL cannot be a base: {}", self.proxy_url)))?
            .pop_if_empty()
            .extend(["api", "github", "oauth", last]);
        Ok(url)
    }

    async fn post_form(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<TokenSet> {
        let url = self.endpoint(endpoint)?;
        debug!(%url, "posting OAuth form");
        let resp = self
            .http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        match parse_token_reply(&body) {
            Ok(tokens) => Ok(tokens),
            Err(OntoError::Json(_)) if !status.is_success() => Err(OntoError::Auth(format!(
                "token endpoint returned {}: {}",
                status,
                body.trim()
            ))),
            Err(e) => Err(e),
        }
    }
}

impl AuthProvider for OAuthProxyDriver {
    async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        self.post_form("token", &[("code", code)]).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet> {
        self.post_form(
            "refresh-token",
            &[("refresh_token", refresh_token), ("grant_type", "refresh_token")],
        )
        .await
    }
}
