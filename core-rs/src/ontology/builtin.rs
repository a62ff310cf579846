//! Bundled core vocabularies (RDF, RDFS, OWL, SKOS)
//!
//! Loaded at start-up as hidden graphs: they feed labels and prefixed names
//! but contribute no tree nodes unless made visible.

use crate::errors::Result;
use crate::ontology::loader::{self, LoadedOntology, ParseOptions};
use crate::store::{QuadIndex, ScopeId, ScopeManager};

#[derive(Debug, Clone, Copy)]
pub struct BuiltinVocabulary {
    pub name: &'static str,
    pub url: &'static str,
    pub source: &'static str,
}

pub const BUILTINS: [BuiltinVocabulary; 4] = [
    BuiltinVocabulary {
        name: "rdf",
        url: "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
        source: include_str!("../../assets/vocab/rdf.ttl"),
    },
    BuiltinVocabulary {
        name: "rdfs",
        url: "http://www.w3.org/2000/01/rdf-schema#",
        source: include_str!("../../assets/vocab/rdfs.ttl"),
    },
    BuiltinVocabulary {
        name: "owl",
        url: "http://www.w3.org/2002/07/owl#",
        source: include_str!("../../assets/vocab/owl.ttl"),
    },
    BuiltinVocabulary {
        name: "skos",
        url: "http://www.w3.org/2004/02/skos/core",
        source: include_str!("../../assets/vocab/skos.ttl"),
    },
];

impl BuiltinVocabulary {
    /// Fixed scope so reloading a built-in never issues new scopes
    pub fn scope_id(&self) -> Result<ScopeId> {
        ScopeId::parse(&format!("builtin{}", self.name))
    }

    /// Replace the vocabulary's graph with the bundled content
    pub fn load(&self, index: &QuadIndex, scopes: &mut ScopeManager) -> Result<LoadedOntology> {
        let parsed = loader::parse(self.source, &ParseOptions::default())?;
        index.delete_graph(parsed.graph.as_ref())?;
        let scope = self.scope_id()?;
        loader::ingest(index, scopes, parsed, Some(&scope))
    }
}

pub fn is_builtin_url(url: &str) -> bool {
    BUILTINS.iter().any(|b| b.url == url)
}
