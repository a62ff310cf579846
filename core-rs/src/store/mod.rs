//! Quad storage layer
//!
//! - QuadIndex: named-graph partitioned quad index over oxigraph
//! - QuadPattern: partially bound lookup pattern
//! - ScopeManager: blank-node scopes, persisted in settings
//! - KeyValueStore: local durable settings (JSON file or memory)

mod index;
mod pattern;
pub mod scope;
pub mod settings;

pub use index::{Backend, QuadIndex, QuadStream};
pub use pattern::QuadPattern;
pub use scope::{BlankNodeRemapper, Scope, ScopeId, ScopeManager};
pub use settings::{JsonFileStore, KeyValueStore, MemoryStore};
