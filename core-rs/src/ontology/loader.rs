/**
 * loader.rs
 * Turtle ingestion into the quad index
 *
 * Loading is split in two so a caller can parse before touching the index:
 * `parse` never writes, `ingest` writes a parsed source under a scope.
 * Neither deletes the previous content of the graph; replacing a graph is
 * the caller's explicit `delete_graph` + `ingest`.
 */

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{GraphName, NamedNode, Quad, Subject, Term};
use tracing::{debug, info};

use crate::errors::{OntoError, Result};
use crate::ontology::prefixes::PrefixMap;
use crate::store::{QuadIndex, QuadPattern, ScopeId, ScopeManager};
use crate::vocab::{self, rdf, vann, ONTOLOGY_MARKERS};

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Base IRI for relative references
    pub base_iri: Option<String>,
    /// Graph to use when the source declares no ontology subject
    pub fallback_graph: Option<NamedNode>,
}

/// A parsed source, not yet written to the index
#[derive(Debug, Clone)]
pub struct ParsedOntology {
    pub graph: NamedNode,
    pub prefixes: PrefixMap,
    pub quads: Vec<Quad>,
}

/// Result of writing a source into the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedOntology {
    pub graph: NamedNode,
    pub prefixes: PrefixMap,
    pub scope: ScopeId,
    pub quad_count: usize,
}

/// Parse Turtle text and work out its graph IRI and prefix map
pub fn parse(source: &str, options: &ParseOptions) -> Result<ParsedOntology> {
    let mut parser = RdfParser::from_format(RdfFormat::Turtle);
    if let Some(base) = &options.base_iri {
        parser = parser
            .with_base_iri(base.as_str())
            .map_err(|e| OntoError::InvalidIri(e.to_string()))?;
    }

    let mut reader = parser.for_reader(source.as_bytes());
    let mut quads = Vec::new();
    for quad in reader.by_ref() {
        quads.push(quad?);
    }

    let mut prefixes: PrefixMap = reader
        .prefixes()
        .filter(|(name, _)| !name.is_empty() && *name != "_")
        .map(|(name, ns)| (name.to_string(), ns.to_string()))
        .collect();

    let graph = match ontology_subject(&quads) {
        Some(graph) => graph,
        None => options
            .fallback_graph
            .clone()
            .ok_or(OntoError::NoOntologySubjectFound)?,
    };

    if let Some((prefix, namespace)) = preferred_namespace(&quads, &graph) {
        prefixes.insert(prefix, namespace);
    }

    debug!(graph = %graph, quads = quads.len(), prefixes = prefixes.len(), "parsed source");
    Ok(ParsedOntology {
        graph,
        prefixes,
        quads,
    })
}

/// Write a parsed source into its graph, renaming blank nodes through a scope
pub fn ingest(
    index: &QuadIndex,
    scopes: &mut ScopeManager,
    parsed: ParsedOntology,
    existing_scope: Option<&ScopeId>,
) -> Result<LoadedOntology> {
    let scope_id = match existing_scope {
        Some(id) => id.clone(),
        None => scopes.create_scope()?,
    };

    let ParsedOntology {
        graph,
        prefixes,
        quads,
    } = parsed;

    // Nothing named by the scope's sequence survives in an empty graph
    if !index.has_any(&QuadPattern::any().graph(graph.clone()))? {
        scopes.restart_ingestion(&scope_id)?;
    }
    let scope = scopes.load_scope(&scope_id)?;

    let quad_count = quads.len();
    let target = GraphName::NamedNode(graph.clone());
    let mut remapper = scope.remapper();
    let inserted = index.put_all(
        quads
            .into_iter()
            .map(|q| Quad::new(q.subject, q.predicate, q.object, target.clone())),
        &mut remapper,
    )?;
    let named = remapper.distinct_blank_nodes() as u64;
    scopes.advance_ingestion(&scope_id, named)?;

    info!(graph = %graph, scope = %scope_id, quads = quad_count, inserted, "ontology loaded");
    Ok(LoadedOntology {
        graph,
        prefixes,
        scope: scope_id,
        quad_count,
    })
}

/// Parse then ingest. Does not clear the graph first.
pub fn load(
    index: &QuadIndex,
    scopes: &mut ScopeManager,
    source: &str,
    existing_scope: Option<&ScopeId>,
    options: &ParseOptions,
) -> Result<LoadedOntology> {
    let parsed = parse(source, options)?;
    ingest(index, scopes, parsed, existing_scope)
}

/// Delete a graph and forget its scope
pub fn unload(
    index: &QuadIndex,
    scopes: &mut ScopeManager,
    graph: &NamedNode,
    scope: Option<&ScopeId>,
) -> Result<usize> {
    let removed = index.delete_graph(graph.as_ref())?;
    if let Some(scope) = scope {
        scopes.delete_scope(scope)?;
    }
    info!(graph = %graph, removed, "ontology unloaded");
    Ok(removed)
}

/// Subject of the first `rdf:type` quad naming an ontology marker
fn ontology_subject(quads: &[Quad]) -> Option<NamedNode> {
    quads.iter().find_map(|q| match (&q.subject, &q.object) {
        (Subject::NamedNode(s), Term::NamedNode(o))
            if q.predicate.as_ref() == rdf::TYPE && vocab::is_one_of(o.as_str(), &ONTOLOGY_MARKERS) =>
        {
            Some(s.clone())
        }
        _ => None,
    })
}

/// `vann:preferredNamespacePrefix` of the graph, with its namespace
fn preferred_namespace(quads: &[Quad], graph: &NamedNode) -> Option<(String, String)> {
    let about_graph = |q: &&Quad| matches!(&q.subject, Subject::NamedNode(s) if s == graph);

    let prefix = quads
        .iter()
        .filter(about_graph)
        .find(|q| q.predicate.as_ref() == vann::PREFERRED_NAMESPACE_PREFIX)
        .and_then(|q| match &q.object {
            Term::Literal(l) if !l.value().trim().is_empty() => Some(l.value().trim().to_string()),
            _ => None,
        })?;

    let declared = quads
        .iter()
        .filter(about_graph)
        .find(|q| q.predicate.as_ref() == vann::PREFERRED_NAMESPACE_URI)
        .and_then(|q| match &q.object {
            Term::Literal(l) => Some(l.value().to_string()),
            Term::NamedNode(n) => Some(n.as_str().to_string()),
            _ => None,
        });

    let namespace = declared.unwrap_or_else(|| default_namespace(graph.as_str()));
    Some((prefix, namespace))
}

/// Graph IRI with `#` appended unless it already ends in `/` or `#`
pub fn default_namespace(graph: &str) -> String {
    if graph.ends_with('/') || graph.ends_with('#') {
        graph.to_string()
    } else {
        format!("{}#", graph)
    }
}
