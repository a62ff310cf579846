//! Memoized substring search over the whole index, for autocomplete

use oxigraph::model::{Subject, Term};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;
use crate::store::{QuadIndex, QuadPattern};
use crate::vocab::{self, LABEL_PREDICATES};

pub const DEFAULT_CAPACITY: usize = 64;

/// Remembers the last `capacity` queries; cleared whenever the index changes
#[derive(Debug)]
pub struct SuggestionCache {
    capacity: usize,
    entries: HashMap<String, Arc<Vec<String>>>,
    order: VecDeque<String>,
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SuggestionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// IRIs whose text or label contains `text` (case-insensitive), sorted
    pub fn suggest(&mut self, index: &QuadIndex, text: &str) -> Result<Arc<Vec<String>>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Arc::new(Vec::new()));
        }
        if let Some(hit) = self.entries.get(&needle) {
            return Ok(hit.clone());
        }

        let found = Arc::new(scan(index, &needle)?);
        debug!(query = %needle, hits = found.len(), "suggestion scan");
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(needle.clone());
        self.entries.insert(needle, found.clone());
        Ok(found)
    }

    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn scan(index: &QuadIndex, needle: &str) -> Result<Vec<String>> {
    let mut hits = BTreeSet::new();
    for quad in index.match_stream(&QuadPattern::any())? {
        let quad = quad?;
        if let Subject::NamedNode(s) = &quad.subject {
            if s.as_str().to_lowercase().contains(needle) {
                hits.insert(s.as_str().to_string());
            }
        }
        if quad.predicate.as_str().to_lowercase().contains(needle) {
            hits.insert(quad.predicate.as_str().to_string());
        }
        match &quad.object {
            Term::NamedNode(o) if o.as_str().to_lowercase().contains(needle) => {
                hits.insert(o.as_str().to_string());
            }
            Term::Literal(l)
                if vocab::is_one_of(quad.predicate.as_str(), &LABEL_PREDICATES)
                    && l.value().to_lowercase().contains(needle) =>
            {
                if let Subject::NamedNode(s) = &quad.subject {
                    hits.insert(s.as_str().to_string());
                }
            }
            _ => {}
        }
    }
    Ok(hits.into_iter().collect())
}
