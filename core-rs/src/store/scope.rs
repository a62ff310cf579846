/**
 * scope.rs
 * Blank-node scopes
 *
 * Every independently loaded source owns a scope. Ingested blank nodes are
 * renamed to `{scope}_{n}`, `n` continuing a sequence persisted per scope, so
 * a second fragment ingested under the same scope never reuses an identity.
 * The sequence restarts when the scope's graph is empty, so re-ingesting the
 * same text after clearing the graph yields the same identities. Two scopes
 * never collide. Blank nodes created by edits are named `{scope}_m{k}` with
 * `k` persisted per scope.
 */

use chrono::{DateTime, Utc};
use oxigraph::model::{BlankNode, GraphName, NamedNode, Quad, Subject, Term};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{OntoError, Result};
use crate::store::settings::{get_json, set_json, KeyValueStore};

/// Settings key holding every known scope
pub const SCOPES_KEY: &str = "scopes";

/// Opaque scope identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn generate() -> Self {
        ScopeId(Uuid::new_v4().simple().to_string())
    }

    /// Accepts identifiers usable inside a blank-node label
    pub fn parse(id: &str) -> Result<Self> {
        if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(ScopeId(id.to_string()))
        } else {
            Err(OntoError::ScopeNotFound(format!("malformed scope id '{}'", id)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a stored blank node was issued under this scope
    pub fn owns(&self, node: &BlankNode) -> bool {
        node.as_str()
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with('_'))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScopeRecord {
    created_at: DateTime<Utc>,
    minted: u64,
    /// Next ordinal for ingested blank nodes
    #[serde(default)]
    ingested: u64,
}

impl ScopeRecord {
    fn fresh() -> Self {
        Self {
            created_at: Utc::now(),
            minted: 0,
            ingested: 0,
        }
    }
}

/// A materialized scope, ready to rename blank nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    id: ScopeId,
    minted: u64,
    ingested: u64,
}

impl Scope {
    pub fn id(&self) -> &ScopeId {
        &self.id
    }

    /// Number of blank nodes minted for edits so far
    pub fn minted(&self) -> u64 {
        self.minted
    }

    /// First ordinal the next ingestion will use
    pub fn ingested(&self) -> u64 {
        self.ingested
    }

    /// Start one ingestion pass, continuing the scope's sequence
    pub fn remapper(&self) -> BlankNodeRemapper<'_> {
        BlankNodeRemapper {
            scope: &self.id,
            start: self.ingested,
            labels: HashMap::new(),
        }
    }
}

/// Renames parsed blank nodes for a single ingestion
pub struct BlankNodeRemapper<'a> {
    scope: &'a ScopeId,
    start: u64,
    labels: HashMap<String, BlankNode>,
}

impl BlankNodeRemapper<'_> {
    pub fn blank_node(&mut self, node: &BlankNode) -> BlankNode {
        if let Some(mapped) = self.labels.get(node.as_str()) {
            return mapped.clone();
        }
        let ordinal = self.start + self.labels.len() as u64;
        let mapped = BlankNode::new_unchecked(format!("{}_{}", self.scope, ordinal));
        self.labels.insert(node.as_str().to_string(), mapped.clone());
        mapped
    }

    pub fn subject(&mut self, subject: Subject) -> Subject {
        match subject {
            Subject::BlankNode(b) => Subject::BlankNode(self.blank_node(&b)),
            other => other,
        }
    }

    pub fn term(&mut self, term: Term) -> Term {
        match term {
            Term::BlankNode(b) => Term::BlankNode(self.blank_node(&b)),
            other => other,
        }
    }

    /// Rename the quad's blank nodes and move it into `graph`
    pub fn quad(&mut self, quad: Quad, graph: &NamedNode) -> Quad {
        let subject = self.subject(quad.subject);
        let object = self.term(quad.object);
        Quad::new(subject, quad.predicate, object, GraphName::NamedNode(graph.clone()))
    }

    pub fn scope(&self) -> &ScopeId {
        self.scope
    }

    pub fn distinct_blank_nodes(&self) -> usize {
        self.labels.len()
    }
}

/// Issues and persists scopes
pub struct ScopeManager {
    settings: Arc<dyn KeyValueStore>,
    scopes: BTreeMap<ScopeId, ScopeRecord>,
}

impl ScopeManager {
    /// Load every persisted scope
    pub fn load(settings: Arc<dyn KeyValueStore>) -> Result<Self> {
        let scopes = get_json(settings.as_ref(), SCOPES_KEY)?.unwrap_or_default();
        Ok(Self { settings, scopes })
    }

    pub fn create_scope(&mut self) -> Result<ScopeId> {
        let id = ScopeId::generate();
        self.scopes.insert(id.clone(), ScopeRecord::fresh());
        self.persist()?;
        debug!(scope = %id, "created scope");
        Ok(id)
    }

    /// Materialize a scope. Unknown identifiers are adopted and persisted.
    pub fn load_scope(&mut self, id: &ScopeId) -> Result<Scope> {
        if !self.scopes.contains_key(id) {
            debug!(scope = %id, "adopting unknown scope");
            self.scopes.insert(id.clone(), ScopeRecord::fresh());
            self.persist()?;
        }
        let (minted, ingested) = self
            .scopes
            .get(id)
            .map(|r| (r.minted, r.ingested))
            .unwrap_or_default();
        Ok(Scope {
            id: id.clone(),
            minted,
            ingested,
        })
    }

    /// Move the ingestion sequence past `count` newly named blank nodes
    pub fn advance_ingestion(&mut self, id: &ScopeId, count: u64) -> Result<()> {
        let record = self
            .scopes
            .get_mut(id)
            .ok_or_else(|| OntoError::ScopeNotFound(id.to_string()))?;
        if count == 0 {
            return Ok(());
        }
        record.ingested += count;
        self.persist()
    }

    /// Restart the ingestion sequence, once nothing named by it is stored
    pub fn restart_ingestion(&mut self, id: &ScopeId) -> Result<()> {
        let record = self
            .scopes
            .get_mut(id)
            .ok_or_else(|| OntoError::ScopeNotFound(id.to_string()))?;
        if record.ingested == 0 {
            return Ok(());
        }
        record.ingested = 0;
        self.persist()
    }

    pub fn delete_scope(&mut self, id: &ScopeId) -> Result<bool> {
        let removed = self.scopes.remove(id).is_some();
        if removed {
            self.persist()?;
            debug!(scope = %id, "deleted scope");
        }
        Ok(removed)
    }

    /// Fresh blank node for an edit made within `id`
    pub fn mint_blank_node(&mut self, id: &ScopeId) -> Result<BlankNode> {
        let record = self
            .scopes
            .get_mut(id)
            .ok_or_else(|| OntoError::ScopeNotFound(id.to_string()))?;
        let node = BlankNode::new_unchecked(format!("{}_m{}", id, record.minted));
        record.minted += 1;
        self.persist()?;
        Ok(node)
    }

    pub fn contains(&self, id: &ScopeId) -> bool {
        self.scopes.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ScopeId> {
        self.scopes.keys()
    }

    fn persist(&self) -> Result<()> {
        set_json(self.settings.as_ref(), SCOPES_KEY, &self.scopes)
    }
}
