//! Quad Index Contract Tests
//!
//! These tests verify INVARIANTS of the quad index and blank-node scoping that
//! MUST NEVER BREAK regardless of the storage backend.
//!
//! **Problem**: a backend swap or "simplified" remapping silently merges blank nodes
//! **Solution**: contract tests that fail with a clear explanation of what broke

use oxigraph::model::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};
use ontoview_core::ontology::{self, ParseOptions};
use ontoview_core::{MemoryStore, OntoError, QuadIndex, QuadPattern, ScopeManager};
use std::collections::BTreeSet;
use std::sync::Arc;

const SOURCE_A: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
<http://ex.org/a> a owl:Ontology .
<http://ex.org/a#X> rdfs:subClassOf _:b0 .
_:b0 owl:onProperty <http://ex.org/a#p> .
"#;

const SOURCE_B: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
<http://ex.org/b> a owl:Ontology .
<http://ex.org/b#Y> rdfs:subClassOf _:b0 .
_:b0 owl:onProperty <http://ex.org/b#q> .
"#;

fn open() -> QuadIndex {
    let mut index = QuadIndex::in_memory();
    index.open().unwrap();
    index
}

fn sample_quad() -> Quad {
    Quad::new(
        NamedNode::new_unchecked("http://ex.org/o#A"),
        NamedNode::new_unchecked("http://www.w3.org/2000/01/rdf-schema#label"),
        Literal::new_simple_literal("A"),
        GraphName::NamedNode(NamedNode::new_unchecked("http://ex.org/o")),
    )
}

fn blank_nodes(index: &QuadIndex) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for quad in index.match_quads(&QuadPattern::any()).unwrap() {
        if let Subject::BlankNode(b) = &quad.subject {
            found.insert(b.as_str().to_string());
        }
        if let Term::BlankNode(b) = &quad.object {
            found.insert(b.as_str().to_string());
        }
    }
    found
}

/// WHY: Quads are a set
/// REASON: Re-loading or re-applying an edit must not duplicate statements
/// BREAKS: Tree derivation (duplicate children) and serializer output
#[test]
fn put_and_delete_are_idempotent() {
    let index = open();
    let quad = sample_quad();

    assert!(index.put(&quad).unwrap());
    assert!(!index.put(&quad).unwrap());
    assert_eq!(index.len().unwrap(), 1);

    assert!(index.delete(&quad).unwrap());
    assert!(!index.delete(&quad).unwrap());
    assert!(index.is_empty().unwrap());
}

/// WHY: Every quad belongs to exactly one named graph
/// REASON: Graph deletion is how a source is replaced or removed
/// BREAKS: Stray default-graph quads would survive every reload
#[test]
fn default_graph_quads_are_rejected() {
    let index = open();
    let quad = Quad::new(
        NamedNode::new_unchecked("http://ex.org/s"),
        NamedNode::new_unchecked("http://ex.org/p"),
        Literal::new_simple_literal("o"),
        GraphName::DefaultGraph,
    );
    assert!(matches!(index.put(&quad), Err(OntoError::InvalidQuad(_))));
}

/// WHY: A closed index fails loudly
/// REASON: Silent empty results after close would look like an empty ontology
/// BREAKS: Callers that treat "no quads" as "nothing loaded"
#[test]
fn closed_index_reports_not_open() {
    let mut index = open();
    index.close().unwrap();
    assert!(matches!(index.put(&sample_quad()), Err(OntoError::NotOpen)));
    assert!(matches!(index.match_quads(&QuadPattern::any()), Err(OntoError::NotOpen)));
}

/// WHY: delete_graph removes exactly one graph
/// REASON: Removing one source must not touch any other source
/// BREAKS: Multi-source isolation
#[test]
fn delete_graph_is_exact() {
    let index = open();
    let mut scopes = ScopeManager::load(Arc::new(MemoryStore::new())).unwrap();
    let a = ontology::load(&index, &mut scopes, SOURCE_A, None, &ParseOptions::default()).unwrap();
    let b = ontology::load(&index, &mut scopes, SOURCE_B, None, &ParseOptions::default()).unwrap();
    let before_b = index.match_quads(&QuadPattern::any().graph(b.graph.clone())).unwrap().len();

    assert_eq!(index.delete_graph(a.graph.as_ref()).unwrap(), a.quad_count);
    assert!(!index.has_any(&QuadPattern::any().graph(a.graph.clone())).unwrap());
    assert_eq!(index.match_quads(&QuadPattern::any().graph(b.graph)).unwrap().len(), before_b);
}

/// WHY: Same blank-node label in two sources, two scopes, two nodes
/// REASON: Blank-node labels are local to one document
/// BREAKS: Restrictions of one ontology would gain properties of another
#[test]
fn scopes_isolate_blank_nodes() {
    let index = open();
    let mut scopes = ScopeManager::load(Arc::new(MemoryStore::new())).unwrap();
    ontology::load(&index, &mut scopes, SOURCE_A, None, &ParseOptions::default()).unwrap();
    ontology::load(&index, &mut scopes, SOURCE_B, None, &ParseOptions::default()).unwrap();

    assert_eq!(blank_nodes(&index).len(), 2);
}

/// WHY: Same source, same scope, same blank nodes
/// REASON: Persisted scopes make re-ingestion deterministic across sessions
/// BREAKS: Journal entries and references to blank nodes after a reload
#[test]
fn same_scope_reproduces_blank_nodes() {
    let index = open();
    let mut scopes = ScopeManager::load(Arc::new(MemoryStore::new())).unwrap();
    let first = ontology::load(&index, &mut scopes, SOURCE_A, None, &ParseOptions::default()).unwrap();
    let ids_first = blank_nodes(&index);

    index.delete_graph(first.graph.as_ref()).unwrap();
    ontology::load(&index, &mut scopes, SOURCE_A, Some(&first.scope), &ParseOptions::default()).unwrap();

    assert_eq!(blank_nodes(&index), ids_first);
}

/// WHY: A second fragment under the same scope continues the blank-node sequence
/// REASON: Fragments reuse file-local labels like `_:b0` for unrelated structure
/// BREAKS: Two restrictions from different fragments merge into one node
#[test]
fn same_scope_fragments_never_collide() {
    const FRAGMENT: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
<http://ex.org/a> a owl:Ontology .
<http://ex.org/a#Z> rdfs:subClassOf _:b0 .
_:b0 owl:onProperty <http://ex.org/a#r> .
"#;
    let index = open();
    let mut scopes = ScopeManager::load(Arc::new(MemoryStore::new())).unwrap();
    let first = ontology::load(&index, &mut scopes, SOURCE_A, None, &ParseOptions::default()).unwrap();
    let ids_first = blank_nodes(&index);

    ontology::load(&index, &mut scopes, FRAGMENT, Some(&first.scope), &ParseOptions::default()).unwrap();
    let ids_both = blank_nodes(&index);

    assert_eq!(ids_both.len(), ids_first.len() * 2);
    let on_property = QuadPattern::any().predicate(NamedNode::new_unchecked("http://www.w3.org/2002/07/owl#onProperty"));
    let restrictions: BTreeSet<String> = index
        .match_quads(&on_property)
        .unwrap()
        .into_iter()
        .map(|q| q.subject.to_string())
        .collect();
    assert_eq!(restrictions.len(), 2);
}

/// WHY: Minted blank nodes never reuse an ingested identity
/// REASON: New anonymous structure added by an edit must stay distinct
/// BREAKS: An edit could splice itself into an existing restriction
#[test]
fn minted_blank_nodes_are_fresh() {
    let index = open();
    let mut scopes = ScopeManager::load(Arc::new(MemoryStore::new())).unwrap();
    let loaded = ontology::load(&index, &mut scopes, SOURCE_A, None, &ParseOptions::default()).unwrap();

    let ingested = blank_nodes(&index);
    let first: BlankNode = scopes.mint_blank_node(&loaded.scope).unwrap();
    let second = scopes.mint_blank_node(&loaded.scope).unwrap();

    assert_ne!(first, second);
    assert!(!ingested.contains(first.as_str()));
    assert!(!ingested.contains(second.as_str()));
}

/// WHY: match_stream restarts per call
/// REASON: Autocomplete scans the whole index repeatedly
/// BREAKS: Second scan would see nothing
#[test]
fn match_stream_is_restartable() {
    let index = open();
    index.put(&sample_quad()).unwrap();

    let first = index.match_stream(&QuadPattern::any()).unwrap().count();
    let second = index.match_stream(&QuadPattern::any()).unwrap().count();
    assert_eq!(first, 1);
    assert_eq!(second, 1);
}
