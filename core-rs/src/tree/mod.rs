//! Derived hierarchies over the visible graphs
//!
//! Four derivations, each rebuilt on demand and returned as an owned snapshot:
//! - class tree (rdfs:subClassOf, plus owl:intersectionOf members)
//! - property tree (rdfs:subPropertyOf)
//! - decomposition tree (has-part restrictions and SHACL shapes)
//! - individuals grouped by type
//!
//! An empty visible set yields an empty forest. Cyclic assertions are cut at
//! the back edge; subjects only reachable through a cycle become roots.

mod classes;
mod decomposition;
mod hierarchy;
mod individuals;

use oxigraph::model::{NamedNode, Subject, Term};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::errors::Result;
use crate::ontology::labels::label;
use crate::ontology::prefixes::PrefixRegistry;
use crate::store::{QuadIndex, QuadPattern};
use crate::vocab::rdf;

pub use classes::{class_tree, property_tree};
pub use decomposition::decomposition_tree;
pub use individuals::individuals_tree;

/// One node of a derived hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTreeNode {
    pub key: String,
    pub label: String,
    pub graph: String,
    pub prefixed_iri: String,
    /// Predicate linking this node to its parent, absent on roots
    pub parent_predicate: Option<String>,
    pub children: Vec<ResourceTreeNode>,
}

impl ResourceTreeNode {
    /// Every key in this subtree, depth first
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = vec![self.key.as_str()];
        for child in &self.children {
            keys.extend(child.keys());
        }
        keys
    }

    pub fn find(&self, key: &str) -> Option<&ResourceTreeNode> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(key))
    }
}

/// Read-only inputs shared by every derivation
pub struct TreeContext<'a> {
    pub index: &'a QuadIndex,
    pub visible: &'a [NamedNode],
    pub prefixes: &'a PrefixRegistry,
}

impl<'a> TreeContext<'a> {
    pub fn new(index: &'a QuadIndex, visible: &'a [NamedNode], prefixes: &'a PrefixRegistry) -> Self {
        Self {
            index,
            visible,
            prefixes,
        }
    }

    pub(crate) fn labeller(&self) -> Labeller<'_> {
        Labeller {
            index: self.index,
            prefixes: self.prefixes,
            cache: HashMap::new(),
        }
    }

    /// Named subjects typed with any of `markers` in a visible graph, first graph wins
    pub(crate) fn typed_subjects(
        &self,
        markers: &[oxigraph::model::NamedNodeRef<'static>],
    ) -> Result<Vec<(NamedNode, NamedNode)>> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for graph in self.visible {
            for marker in markers {
                let pattern = QuadPattern::any()
                    .predicate(rdf::TYPE)
                    .object(*marker)
                    .graph(graph.clone());
                for quad in self.index.match_stream(&pattern)? {
                    if let Subject::NamedNode(subject) = quad?.subject {
                        if seen.insert(subject.clone()) {
                            found.push((subject, graph.clone()));
                        }
                    }
                }
            }
        }
        Ok(found)
    }
}

/// Labels and prefixed names, resolved once per key
pub(crate) struct Labeller<'a> {
    index: &'a QuadIndex,
    prefixes: &'a PrefixRegistry,
    cache: HashMap<String, (String, String)>,
}

impl Labeller<'_> {
    pub(crate) fn resolve(&mut self, key: &str) -> Result<(String, String)> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit.clone());
        }
        let resolved = (label(self.index, key)?, self.prefixes.prefixed_form(key));
        self.cache.insert(key.to_string(), resolved.clone());
        Ok(resolved)
    }

    pub(crate) fn node(
        &mut self,
        key: &str,
        graph: &str,
        parent_predicate: Option<String>,
    ) -> Result<ResourceTreeNode> {
        let (label, prefixed_iri) = self.resolve(key)?;
        Ok(ResourceTreeNode {
            key: key.to_string(),
            label,
            graph: graph.to_string(),
            prefixed_iri,
            parent_predicate,
            children: Vec::new(),
        })
    }
}

/// Members of an rdf:first/rdf:rest list, stopping at rdf:nil or a repeated cell
pub(crate) fn list_members(index: &QuadIndex, head: &Term) -> Result<Vec<Term>> {
    let mut members = Vec::new();
    let mut visited = HashSet::new();
    let mut current = head.clone();
    loop {
        let cell: Subject = match &current {
            Term::BlankNode(b) => b.clone().into(),
            Term::NamedNode(n) if n.as_ref() != rdf::NIL => n.clone().into(),
            _ => break,
        };
        if !visited.insert(cell.clone()) {
            break;
        }
        let first = QuadPattern::any().subject(cell.clone()).predicate(rdf::FIRST);
        if let Some(quad) = index.match_stream(&first)?.next() {
            members.push(quad?.object);
        }
        let rest = QuadPattern::any().subject(cell).predicate(rdf::REST);
        match index.match_stream(&rest)?.next() {
            Some(quad) => current = quad?.object,
            None => break,
        }
    }
    Ok(members)
}

/// Case-sensitive ordering by label, then key
pub(crate) fn sort_by_label(nodes: &mut [ResourceTreeNode]) {
    nodes.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.key.cmp(&b.key)));
}
