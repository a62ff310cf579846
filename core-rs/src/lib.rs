//! # Ontoview Core - ontology graph store and derived views
//!
//! Loads OWL/RDFS/SKOS ontologies written in Turtle into one quad index,
//! one named graph per source, and derives the navigation trees a browser
//! needs: classes, properties, part-whole decomposition and individuals.
//! Edits go through an undoable journal and are written back as Turtle.
//!
//! ## Key Features
//!
//! - Persistent or in-memory quad index (oxigraph)
//! - Scoped blank nodes, so independent sources never collide
//! - Cycle-safe tree derivation over the visible graphs only
//! - Revision-aware reload from GitHub, plain HTTP for everything else
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            OntologyWorkspace             │
//! │  sources · prefixes · journal · suggest  │
//! └──────────────────────────────────────────┘
//!        │                 │            │
//!   ┌────┴─────┐     ┌─────┴────┐  ┌────┴─────┐
//!   │ loader / │     │  tree    │  │ drivers  │
//!   │serializer│     │derivation│  │ (GitHub, │
//!   └────┬─────┘     └─────┬────┘  │  HTTP)   │
//!        └──────┬──────────┘       └──────────┘
//!         ┌─────┴──────┐
//!         │ QuadIndex  │  ScopeManager · KeyValueStore
//!         └────────────┘
//! ```

pub mod errors;
pub mod vocab;
pub mod store;
pub mod ontology;
pub mod tree;
pub mod journal;
pub mod suggest;
pub mod drivers;
pub mod workspace;

pub use errors::{OntoError, Result, TextSpan};
pub use store::{Backend, JsonFileStore, KeyValueStore, MemoryStore, QuadIndex, QuadPattern, Scope, ScopeId, ScopeManager};
pub use ontology::{label, local_name, LoadedOntology, ParseOptions, PrefixMap, PrefixRegistry};
pub use tree::{ResourceTreeNode, TreeContext};
pub use journal::{MutationJournal, QuadAction, QuadChange};
pub use suggest::SuggestionCache;
pub use drivers::{AuthProvider, GitHubDriver, HttpDriver, HttpFetcher, OAuthProxyDriver, RemoteSources, SourceControl, SourceLocator, TokenSet};
pub use workspace::{GraphDetails, OntologyWorkspace, WorkspaceConfig};

/// Crate version, written into serializer output
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
