//! GraphDetails - the persisted record of one user-added ontology source

use chrono::{DateTime, Utc};
use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::drivers::SourceLocator;
use crate::errors::Result;
use crate::ontology::PrefixMap;
use crate::store::ScopeId;

/// Settings key holding the JSON list of sources
pub const USER_GRAPHS_KEY: &str = "userGraphs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDetails {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub loaded: bool,
    /// Last revision id fetched from source control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Graph IRI the source was loaded into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeId>,
    #[serde(default, skip_serializing_if = "PrefixMap::is_empty")]
    pub prefixes: PrefixMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

impl GraphDetails {
    /// A visible, not yet loaded source
    pub fn new(url: &str) -> Result<Self> {
        let locator = SourceLocator::parse(url)?;
        let mut details = Self {
            url: url.trim().to_string(),
            owner: None,
            repo: None,
            branch: None,
            path: None,
            visible: true,
            loaded: false,
            revision: None,
            graph: None,
            scope: None,
            prefixes: PrefixMap::new(),
            error: None,
            loaded_at: None,
        };
        details.apply_locator(&locator);
        Ok(details)
    }

    pub fn locator(&self) -> Result<SourceLocator> {
        SourceLocator::parse(&self.url)
    }

    pub(crate) fn apply_locator(&mut self, locator: &SourceLocator) {
        if let SourceLocator::SourceControl {
            owner,
            repo,
            reference,
            path,
        } = locator
        {
            self.owner = Some(owner.clone());
            self.repo = Some(repo.clone());
            self.branch = Some(reference.clone());
            self.path = Some(path.clone());
        }
    }

    pub fn graph_node(&self) -> Option<NamedNode> {
        self.graph.as_deref().and_then(|g| NamedNode::new(g).ok())
    }

    /// Loaded, visible and backed by a known source-control file
    pub fn is_editable(&self) -> bool {
        self.loaded
            && self.visible
            && self.owner.is_some()
            && self.repo.is_some()
            && self.branch.is_some()
            && self.path.is_some()
    }

    pub(crate) fn record_failure(&mut self, message: String) {
        self.loaded = false;
        self.error = Some(message);
    }
}
