/**
 * index.rs
 * Named-graph partitioned quad index
 *
 * Wraps an oxigraph `Store` (RocksDB on disk, or in memory) behind an
 * explicit open/close lifecycle. Every operation against a closed index
 * fails with `NotOpen`. Streams borrow the index, so `close` cannot run
 * while a scan is still alive.
 */

use oxigraph::model::{GraphName, GraphNameRef, NamedNode, NamedNodeRef, NamedOrBlankNode, Quad};
use oxigraph::store::{QuadIter, Store};
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::errors::{OntoError, Result};
use crate::store::pattern::QuadPattern;
use crate::store::scope::BlankNodeRemapper;

/// Where the index keeps its quads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Disk(PathBuf),
}

pub struct QuadIndex {
    backend: Backend,
    store: Option<Store>,
}

impl QuadIndex {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            store: None,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Backend::Memory)
    }

    pub fn on_disk(path: impl Into<PathBuf>) -> Self {
        Self::new(Backend::Disk(path.into()))
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Open the backend. Opening an open index is a no-op.
    pub fn open(&mut self) -> Result<()> {
        if self.store.is_some() {
            return Ok(());
        }
        let store = match &self.backend {
            Backend::Memory => Store::new()?,
            Backend::Disk(path) => {
                std::fs::create_dir_all(path)?;
                Store::open(path)?
            }
        };
        info!(backend = ?self.backend, "quad index opened");
        self.store = Some(store);
        Ok(())
    }

    /// Flush and release the backend
    pub fn close(&mut self) -> Result<()> {
        let Some(store) = self.store.take() else {
            return Ok(());
        };
        let flushed = match self.backend {
            Backend::Disk(_) => store.flush().map_err(OntoError::from),
            Backend::Memory => Ok(()),
        };
        drop(store);
        info!(backend = ?self.backend, "quad index closed");
        flushed
    }

    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<&Store> {
        self.store.as_ref().ok_or(OntoError::NotOpen)
    }

    /// Insert one quad. Returns false when it was already present.
    pub fn put(&self, quad: &Quad) -> Result<bool> {
        ensure_named_graph(quad)?;
        Ok(self.store()?.insert(quad)?)
    }

    /// Insert quads after renaming their blank nodes through `remapper`.
    /// Returns the number of quads that were not already present.
    pub fn put_all<I>(&self, quads: I, remapper: &mut BlankNodeRemapper<'_>) -> Result<usize>
    where
        I: IntoIterator<Item = Quad>,
    {
        let store = self.store()?;
        let mut inserted = 0;
        for quad in quads {
            let graph = match &quad.graph_name {
                GraphName::NamedNode(g) => g.clone(),
                _ => return Err(OntoError::InvalidQuad(format!("{} is not in a named graph", quad))),
            };
            let quad = remapper.quad(quad, &graph);
            if store.insert(&quad)? {
                inserted += 1;
            }
        }
        debug!(
            scope = %remapper.scope(),
            inserted,
            blank_nodes = remapper.distinct_blank_nodes(),
            "bulk insert"
        );
        Ok(inserted)
    }

    /// Remove one quad. Returns false when it was absent.
    pub fn delete(&self, quad: &Quad) -> Result<bool> {
        Ok(self.store()?.remove(quad)?)
    }

    pub fn contains(&self, quad: &Quad) -> Result<bool> {
        Ok(self.store()?.contains(quad)?)
    }

    /// Materialized matches for `pattern`
    pub fn match_quads(&self, pattern: &QuadPattern) -> Result<Vec<Quad>> {
        self.match_stream(pattern)?.collect()
    }

    /// Lazy single-pass scan. Each call starts a new scan.
    pub fn match_stream(&self, pattern: &QuadPattern) -> Result<QuadStream<'_>> {
        let iter = self.store()?.quads_for_pattern(
            pattern.subject_ref(),
            pattern.predicate_ref(),
            pattern.object_ref(),
            pattern.graph_ref(),
        );
        Ok(QuadStream {
            inner: iter,
            _index: PhantomData,
        })
    }

    pub fn has_any(&self, pattern: &QuadPattern) -> Result<bool> {
        match self.match_stream(pattern)?.next() {
            Some(quad) => quad.map(|_| true),
            None => Ok(false),
        }
    }

    /// Drop every quad of one graph. Returns how many were removed.
    pub fn delete_graph(&self, graph: NamedNodeRef<'_>) -> Result<usize> {
        let store = self.store()?;
        let name = GraphNameRef::NamedNode(graph);
        let count = store
            .quads_for_pattern(None, None, None, Some(name))
            .try_fold(0usize, |n, q| q.map(|_| n + 1))?;
        store.clear_graph(name)?;
        store.remove_named_graph(graph)?;
        debug!(graph = %graph, count, "graph deleted");
        Ok(count)
    }

    /// Named graphs that currently hold at least one quad
    pub fn graphs(&self) -> Result<Vec<NamedNode>> {
        let mut graphs = Vec::new();
        for name in self.store()?.named_graphs() {
            if let NamedOrBlankNode::NamedNode(node) = name? {
                if self.has_any(&QuadPattern::any().graph(node.clone()))? {
                    graphs.push(node);
                }
            }
        }
        Ok(graphs)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.store()?.len()?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.store()?.is_empty()?)
    }
}

impl Drop for QuadIndex {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to flush quad index on drop");
        }
    }
}

fn ensure_named_graph(quad: &Quad) -> Result<()> {
    match quad.graph_name {
        GraphName::NamedNode(_) => Ok(()),
        _ => Err(OntoError::InvalidQuad(format!("{} is not in a named graph", quad))),
    }
}

/// Lazy scan over a storage snapshot
pub struct QuadStream<'a> {
    inner: QuadIter,
    _index: PhantomData<&'a QuadIndex>,
}

impl Iterator for QuadStream<'_> {
    type Item = Result<Quad>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|q| q.map_err(OntoError::from))
    }
}
