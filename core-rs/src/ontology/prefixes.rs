/**
 * prefixes.rs
 * Prefix maps per graph and prefixed-name display
 */

use oxigraph::model::NamedNode;
use std::collections::BTreeMap;

/// Short name -> namespace IRI
pub type PrefixMap = BTreeMap<String, String>;

#[derive(Debug, Clone)]
struct Entry {
    graph: NamedNode,
    prefixes: PrefixMap,
    builtin: bool,
}

/// Prefix maps of every known graph, built-ins first, then user graphs in load order
#[derive(Debug, Clone, Default)]
pub struct PrefixRegistry {
    entries: Vec<Entry>,
}

impl PrefixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the prefix map of `graph`. Re-registering keeps the original position.
    pub fn register(&mut self, graph: &NamedNode, prefixes: PrefixMap, builtin: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| &e.graph == graph) {
            entry.prefixes = prefixes;
            return;
        }
        let entry = Entry {
            graph: graph.clone(),
            prefixes,
            builtin,
        };
        if builtin {
            let at = self.entries.iter().take_while(|e| e.builtin).count();
            self.entries.insert(at, entry);
        } else {
            self.entries.push(entry);
        }
    }

    pub fn unregister(&mut self, graph: &NamedNode) {
        self.entries.retain(|e| &e.graph != graph);
    }

    pub fn get(&self, graph: &NamedNode) -> Option<&PrefixMap> {
        self.entries.iter().find(|e| &e.graph == graph).map(|e| &e.prefixes)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `short:suffix` from the first graph whose map covers `iri`, else `iri` unchanged
    pub fn prefixed_form(&self, iri: &str) -> String {
        self.entries
            .iter()
            .find_map(|e| compact_with(&e.prefixes, iri))
            .unwrap_or_else(|| iri.to_string())
    }
}

/// Compact `iri` against one map, preferring the longest namespace
pub fn compact_with(prefixes: &PrefixMap, iri: &str) -> Option<String> {
    prefixes
        .iter()
        .filter(|(_, ns)| !ns.is_empty() && iri.starts_with(ns.as_str()))
        .max_by_key(|(_, ns)| ns.len())
        .map(|(name, ns)| format!("{}:{}", name, &iri[ns.len()..]))
}
