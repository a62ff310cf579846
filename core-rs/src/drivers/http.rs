//! HttpDriver - plain GET for ontology sources outside source control

use reqwest::StatusCode;
use tracing::debug;

use super::traits::HttpFetcher;
use crate::errors::{OntoError, Result};

const TURTLE_ACCEPT: &str = "text/turtle, application/x-turtle;q=0.9, */*;q=0.1";

/// HTTP fetcher for Turtle documents
#[derive(Debug, Clone)]
pub struct HttpDriver {
    http: reqwest::Client,
}

impl HttpDriver {
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { http })
    }
}

impl HttpFetcher for HttpDriver {
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!(url, "fetching source");
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, TURTLE_ACCEPT)
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(resp.text().await?),
            StatusCode::NOT_FOUND => Err(OntoError::SourceNotFound(url.to_string())),
            s => Err(OntoError::NetworkFailure(format!("GET {} returned {}", url, s))),
        }
    }
}
