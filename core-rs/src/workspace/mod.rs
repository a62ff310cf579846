//! Ontology workspace - one explicitly owned session over the quad index
//!
//! Owns the index, scopes, prefix registry, settings, journal and suggestion
//! cache, and drives the source-control/HTTP collaborators to (re)load sources.
//!
//! Lifecycle:
//! ```text
//! open ──▶ initialize ──▶ add/remove/reload/toggle ──▶ edit/undo/redo ──▶ commit ──▶ close
//!            │
//!            └─ built-ins first, then every persisted source
//! ```

pub mod config;
pub mod details;

pub use config::WorkspaceConfig;
pub use details::{GraphDetails, USER_GRAPHS_KEY};

use chrono::Utc;
use oxigraph::model::{BlankNode, GraphNameRef, NamedNode, Quad};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::drivers::{CommitRequest, HttpFetcher, SourceControl, SourceLocator, TokenSet};
use crate::errors::{OntoError, Result};
use crate::journal::{MutationJournal, QuadAction, QuadChange};
use crate::ontology::builtin::is_builtin_url;
use crate::ontology::{self, loader, ParseOptions, PrefixRegistry, BUILTINS};
use crate::store::settings::{get_json, set_json};
use crate::store::{KeyValueStore, QuadIndex, QuadPattern, ScopeId, ScopeManager};
use crate::suggest::SuggestionCache;
use crate::tree::{self, ResourceTreeNode, TreeContext};

/// Settings key holding the token set from the last OAuth exchange
pub const GITHUB_TOKEN_KEY: &str = "githubToken";

pub fn load_token(settings: &dyn KeyValueStore) -> Result<Option<TokenSet>> {
    get_json(settings, GITHUB_TOKEN_KEY)
}

pub fn save_token(settings: &dyn KeyValueStore, tokens: &TokenSet) -> Result<()> {
    set_json(settings, GITHUB_TOKEN_KEY, tokens)
}

/// Source text plus the revision it was read at
enum Fetched {
    Content { text: String, revision: Option<String> },
    Unchanged,
}

pub struct OntologyWorkspace<D> {
    index: QuadIndex,
    settings: Arc<dyn KeyValueStore>,
    scopes: ScopeManager,
    prefixes: PrefixRegistry,
    sources: Vec<GraphDetails>,
    builtins: Vec<NamedNode>,
    journal: MutationJournal,
    suggestions: SuggestionCache,
    drivers: D,
}

impl<D> OntologyWorkspace<D>
where
    D: SourceControl + HttpFetcher,
{
    /// Open the index and restore persisted scopes and sources
    pub fn open(config: &WorkspaceConfig, settings: Arc<dyn KeyValueStore>, drivers: D) -> Result<Self> {
        config.validate()?;
        let mut index = if config.in_memory {
            QuadIndex::in_memory()
        } else {
            QuadIndex::on_disk(config.store_path())
        };
        index.open()?;

        let scopes = ScopeManager::load(settings.clone())?;
        let sources: Vec<GraphDetails> = get_json(settings.as_ref(), USER_GRAPHS_KEY)?.unwrap_or_default();

        let mut prefixes = PrefixRegistry::new();
        for source in &sources {
            if let Some(graph) = source.graph_node() {
                prefixes.register(&graph, source.prefixes.clone(), false);
            }
        }

        info!(sources = sources.len(), backend = ?index.backend(), "workspace opened");
        Ok(Self {
            index,
            settings,
            scopes,
            prefixes,
            sources,
            builtins: Vec::new(),
            journal: MutationJournal::new(),
            suggestions: SuggestionCache::new(config.suggestion_capacity),
            drivers,
        })
    }

    /// Load the built-in vocabularies, then every persisted source
    ///
    /// A source that fails to load is recorded on its `GraphDetails` and
    /// skipped; only store-level failures abort initialization.
    pub async fn initialize(&mut self) -> Result<()> {
        self.load_builtins()?;

        let urls: Vec<String> = self.sources.iter().map(|s| s.url.clone()).collect();
        for url in urls {
            match self.reload_source(&url).await {
                Ok(_) => {}
                Err(e) if e.is_load_failure() => warn!(url = %url, error = %e, "source failed to load"),
                Err(e) => return Err(e),
            }
        }
        self.suggestions.invalidate();
        info!(builtins = self.builtins.len(), sources = self.sources.len(), "workspace initialized");
        Ok(())
    }

    /// Replace the built-in vocabulary graphs with the bundled content
    ///
    /// Enough for read-only use of an on-disk index whose sources are already loaded.
    pub fn load_builtins(&mut self) -> Result<()> {
        self.builtins.clear();
        for builtin in &BUILTINS {
            let loaded = builtin.load(&self.index, &mut self.scopes)?;
            self.prefixes.register(&loaded.graph, loaded.prefixes, true);
            self.builtins.push(loaded.graph);
        }
        self.suggestions.invalidate();
        Ok(())
    }

    pub fn sources(&self) -> &[GraphDetails] {
        &self.sources
    }

    pub fn source(&self, url: &str) -> Option<&GraphDetails> {
        self.sources.iter().find(|s| s.url == url.trim())
    }

    pub fn index(&self) -> &QuadIndex {
        &self.index
    }

    pub fn prefixes(&self) -> &PrefixRegistry {
        &self.prefixes
    }

    pub fn settings(&self) -> &Arc<dyn KeyValueStore> {
        &self.settings
    }

    pub fn drivers_mut(&mut self) -> &mut D {
        &mut self.drivers
    }

    fn position(&self, url: &str) -> Result<usize> {
        self.sources
            .iter()
            .position(|s| s.url == url.trim())
            .ok_or_else(|| OntoError::SourceNotFound(url.to_string()))
    }

    fn persist(&self) -> Result<()> {
        set_json(self.settings.as_ref(), USER_GRAPHS_KEY, &self.sources)
    }

    // ==========================================================================
    // Sources
    // ==========================================================================

    /// Add a visible source, replacing any source with the same URL
    ///
    /// The record is kept even when loading fails so the error stays visible.
    pub async fn add_source(&mut self, url: &str) -> Result<GraphDetails> {
        let details = GraphDetails::new(url)?;
        if is_builtin_url(&details.url) {
            warn!(url = %details.url, "refusing to shadow a built-in vocabulary");
            return Err(OntoError::InvalidIri(format!("{} is a built-in vocabulary", details.url)));
        }
        if self.source(&details.url).is_some() {
            self.remove_source(&details.url)?;
        }
        let url = details.url.clone();
        self.sources.push(details);
        self.persist()?;
        info!(url = %url, "source added");
        self.reload_source(&url).await
    }

    /// Delete the source's graph and scope and forget it
    pub fn remove_source(&mut self, url: &str) -> Result<GraphDetails> {
        let pos = self.position(url)?;
        let removed = self.sources.remove(pos);

        match removed.graph_node() {
            Some(graph) => {
                loader::unload(&self.index, &mut self.scopes, &graph, removed.scope.as_ref())?;
                self.prefixes.unregister(&graph);
            }
            None => {
                if let Some(scope) = &removed.scope {
                    self.scopes.delete_scope(scope)?;
                }
            }
        }

        self.journal.clear();
        self.suggestions.invalidate();
        self.persist()?;
        info!(url = %removed.url, "source removed");
        Ok(removed)
    }

    /// Fetch and load a source, skipping the parse when its revision is unchanged
    ///
    /// # Failure
    ///
    /// Fetch and parse failures are recorded in `GraphDetails.error` with
    /// `loaded = false`, the previously loaded graph stays in the index, and
    /// the error is returned.
    pub async fn reload_source(&mut self, url: &str) -> Result<GraphDetails> {
        let pos = self.position(url)?;
        let outcome = match self.fetch(pos).await {
            Ok(Fetched::Unchanged) => Ok(None),
            Ok(Fetched::Content { text, revision }) => self.replace_graph(pos, &text, revision).map(Some),
            Err(e) => Err(e),
        };

        let details = &mut self.sources[pos];
        match outcome {
            Ok(changed) => {
                if changed.is_none() {
                    debug!(url = %details.url, "revision unchanged, keeping loaded graph");
                    details.loaded = true;
                    details.error = None;
                }
                let details = details.clone();
                self.persist()?;
                Ok(details)
            }
            Err(e) if e.is_load_failure() => {
                warn!(url = %details.url, error = %e, "load failed, keeping previous graph");
                details.record_failure(e.to_string());
                self.persist()?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch(&self, pos: usize) -> Result<Fetched> {
        let details = &self.sources[pos];
        match details.locator()? {
            SourceLocator::SourceControl {
                owner,
                repo,
                reference,
                path,
            } => {
                let revision = self
                    .drivers
                    .get_latest_revision_id(&owner, &repo, &path, &reference)
                    .await?;
                if details.revision.as_deref() == Some(revision.as_str()) && self.graph_present(details)? {
                    return Ok(Fetched::Unchanged);
                }
                let text = self.drivers.get_file_content(&owner, &repo, &path, &reference).await?;
                Ok(Fetched::Content {
                    text,
                    revision: Some(revision),
                })
            }
            SourceLocator::Http { url } => Ok(Fetched::Content {
                text: self.drivers.get_text(&url).await?,
                revision: None,
            }),
        }
    }

    fn graph_present(&self, details: &GraphDetails) -> Result<bool> {
        match details.graph_node() {
            Some(graph) => self.index.has_any(&QuadPattern::any().graph(graph)),
            None => Ok(false),
        }
    }

    /// Parse first, then swap the source's graph for the new content
    fn replace_graph(&mut self, pos: usize, text: &str, revision: Option<String>) -> Result<()> {
        let details = &self.sources[pos];
        let base_iri = match details.locator()? {
            SourceLocator::Http { url } => Some(url),
            SourceLocator::SourceControl { .. } => None,
        };
        let parsed = loader::parse(
            text,
            &ParseOptions {
                base_iri,
                fallback_graph: None,
            },
        )?;

        if let Some(other) = self
            .sources
            .iter()
            .enumerate()
            .find(|(i, s)| *i != pos && s.graph.as_deref() == Some(parsed.graph.as_str()))
        {
            warn!(graph = %parsed.graph, other = %other.1.url, "graph is shared with another source");
        }

        let previous = details.graph_node();
        if let Some(previous) = &previous {
            self.index.delete_graph(previous.as_ref())?;
            if previous != &parsed.graph {
                self.prefixes.unregister(previous);
            }
        }
        self.index.delete_graph(parsed.graph.as_ref())?;

        let scope = self.sources[pos].scope.clone();
        let loaded = loader::ingest(&self.index, &mut self.scopes, parsed, scope.as_ref())?;
        self.prefixes.register(&loaded.graph, loaded.prefixes.clone(), false);

        let details = &mut self.sources[pos];
        details.graph = Some(loaded.graph.into_string());
        details.scope = Some(loaded.scope);
        details.prefixes = loaded.prefixes;
        details.revision = revision;
        details.loaded = true;
        details.error = None;
        details.loaded_at = Some(Utc::now());

        self.journal.clear();
        self.suggestions.invalidate();
        Ok(())
    }

    /// Flip visibility. Returns the new value.
    pub fn toggle_visibility(&mut self, url: &str) -> Result<bool> {
        let pos = self.position(url)?;
        let details = &mut self.sources[pos];
        details.visible = !details.visible;
        let visible = details.visible;
        self.persist()?;
        debug!(url = %url, visible, "visibility toggled");
        Ok(visible)
    }

    /// Graphs of visible sources, in source order
    pub fn visible_graphs(&self) -> Vec<NamedNode> {
        self.sources
            .iter()
            .filter(|s| s.visible)
            .filter_map(|s| s.graph_node())
            .collect()
    }

    // ==========================================================================
    // Derived views
    // ==========================================================================

    fn derive<F>(&self, derivation: F) -> Result<Vec<ResourceTreeNode>>
    where
        F: FnOnce(&TreeContext<'_>) -> Result<Vec<ResourceTreeNode>>,
    {
        let visible = self.visible_graphs();
        derivation(&TreeContext::new(&self.index, &visible, &self.prefixes))
    }

    pub fn class_tree(&self) -> Result<Vec<ResourceTreeNode>> {
        self.derive(tree::class_tree)
    }

    pub fn property_tree(&self) -> Result<Vec<ResourceTreeNode>> {
        self.derive(tree::property_tree)
    }

    pub fn decomposition_tree(&self) -> Result<Vec<ResourceTreeNode>> {
        self.derive(tree::decomposition_tree)
    }

    pub fn individuals_tree(&self) -> Result<Vec<ResourceTreeNode>> {
        self.derive(tree::individuals_tree)
    }

    pub fn label(&self, iri: &str) -> Result<String> {
        ontology::label(&self.index, iri)
    }

    pub fn prefixed_form(&self, iri: &str) -> String {
        self.prefixes.prefixed_form(iri)
    }

    /// Quads about `iri`, built-in graphs first, then sources in order
    pub fn subject_quads(&self, iri: &str) -> Result<Vec<Quad>> {
        let subject = NamedNode::new(iri)?;
        let graphs = self
            .builtins
            .iter()
            .cloned()
            .chain(self.sources.iter().filter_map(|s| s.graph_node()));

        let mut quads = Vec::new();
        for graph in graphs {
            let pattern = QuadPattern::any().subject(subject.clone()).graph(graph);
            quads.extend(self.index.match_quads(&pattern)?);
        }
        Ok(quads)
    }

    /// Autocomplete candidates for `text`, at most `limit`
    pub fn suggest(&mut self, text: &str, limit: usize) -> Result<Vec<String>> {
        let all = self.suggestions.suggest(&self.index, text)?;
        Ok(all.iter().take(limit).cloned().collect())
    }

    // ==========================================================================
    // Editing
    // ==========================================================================

    fn scope_for(&self, quad: &Quad) -> Result<ScopeId> {
        let graph = match quad.graph_name.as_ref() {
            GraphNameRef::NamedNode(g) => g,
            _ => return Err(OntoError::InvalidQuad(format!("quad must name a graph: {}", quad))),
        };
        let source = self
            .sources
            .iter()
            .find(|s| s.graph.as_deref() == Some(graph.as_str()))
            .ok_or_else(|| OntoError::GraphNotFound(graph.as_str().to_string()))?;
        source
            .scope
            .clone()
            .ok_or_else(|| OntoError::ScopeNotFound(source.url.clone()))
    }

    fn mutate(&mut self, action: QuadAction, quad: Quad) -> Result<bool> {
        let scope = self.scope_for(&quad)?;
        let changed = self.journal.apply(&self.index, action, quad, &scope)?;
        if changed {
            self.suggestions.invalidate();
        }
        Ok(changed)
    }

    pub fn add_quad(&mut self, quad: Quad) -> Result<bool> {
        self.mutate(QuadAction::Add, quad)
    }

    pub fn remove_quad(&mut self, quad: Quad) -> Result<bool> {
        self.mutate(QuadAction::Remove, quad)
    }

    pub fn edit_quad(&mut self, old: Quad, new: Quad) -> Result<()> {
        let scope = self.scope_for(&old)?;
        self.scope_for(&new)?;
        self.journal.edit(&self.index, old, new, &scope)?;
        self.suggestions.invalidate();
        Ok(())
    }

    pub fn undo(&mut self) -> Result<Option<QuadChange>> {
        let change = self.journal.undo(&self.index)?;
        if change.as_ref().is_some_and(|c| c.changed) {
            self.suggestions.invalidate();
        }
        Ok(change)
    }

    pub fn redo(&mut self) -> Result<Option<QuadChange>> {
        let change = self.journal.redo(&self.index)?;
        if change.as_ref().is_some_and(|c| c.changed) {
            self.suggestions.invalidate();
        }
        Ok(change)
    }

    pub fn clear_history(&mut self) {
        self.journal.clear();
    }

    pub fn journal(&self) -> &MutationJournal {
        &self.journal
    }

    /// Fresh blank node in the source's scope
    pub fn new_blank_node(&mut self, url: &str) -> Result<BlankNode> {
        let pos = self.position(url)?;
        let scope = self.sources[pos]
            .scope
            .clone()
            .ok_or_else(|| OntoError::ScopeNotFound(url.to_string()))?;
        self.scopes.mint_blank_node(&scope)
    }

    // ==========================================================================
    // Output
    // ==========================================================================

    pub fn serialize(&self, url: &str) -> Result<String> {
        let details = &self.sources[self.position(url)?];
        let graph = details
            .graph_node()
            .ok_or_else(|| OntoError::GraphNotFound(details.url.clone()))?;
        ontology::serialize(&self.index, graph.as_ref(), &details.prefixes)
    }

    /// Serialize and commit the source back to source control
    ///
    /// # Returns
    ///
    /// Revision id of the new commit, also stored on the source
    pub async fn commit(&mut self, url: &str, message: &str) -> Result<String> {
        let pos = self.position(url)?;
        let details = &self.sources[pos];
        let (Some(owner), Some(repo), Some(branch), Some(path)) =
            (&details.owner, &details.repo, &details.branch, &details.path)
        else {
            return Err(OntoError::SourceNotEditable(details.url.clone()));
        };
        if !details.is_editable() {
            return Err(OntoError::SourceNotEditable(details.url.clone()));
        }

        let content = self.serialize(url)?;
        let revision = self
            .drivers
            .commit_file(CommitRequest {
                owner,
                repo,
                path,
                branch,
                content: &content,
                message,
            })
            .await?;

        info!(url = %details.url, revision = %revision, "source committed");
        self.sources[pos].revision = Some(revision.clone());
        self.persist()?;
        Ok(revision)
    }

    /// Persist sources and release the index. Later calls fail with `NotOpen`.
    pub fn close(&mut self) -> Result<()> {
        self.persist()?;
        self.index.close()?;
        info!("workspace closed");
        Ok(())
    }
}
