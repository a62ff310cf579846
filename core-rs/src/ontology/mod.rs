//! Ontology ingestion, display and serialization
//!
//! - loader: parse Turtle, find the graph IRI and prefixes, ingest under a scope
//! - prefixes: per-graph prefix maps and prefixed-name display
//! - labels: English labels with local-name fallback
//! - serializer: Turtle output for one graph
//! - builtin: bundled RDF/RDFS/OWL/SKOS vocabularies
//! - query: per-resource lookups (domains, ranges, instances, restrictions)

pub mod builtin;
pub mod labels;
pub mod loader;
pub mod prefixes;
pub mod query;
pub mod serializer;

pub use builtin::{BuiltinVocabulary, BUILTINS};
pub use labels::{label, local_name};
pub use loader::{ingest, load, parse, unload, LoadedOntology, ParseOptions, ParsedOntology};
pub use prefixes::{PrefixMap, PrefixRegistry};
pub use serializer::serialize;
