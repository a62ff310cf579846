//! Integration tests for loading and serializing ontology sources
//!
//! Tests the path a source takes through the store:
//! - Parse and ingest under a scope
//! - Serialize back to Turtle
//! - Re-load the output and compare quad sets
//! - Persistence of an on-disk index across reopen

use oxigraph::model::{NamedNode, Subject, Term};
use ontoview_core::ontology::{self, ParseOptions};
use ontoview_core::{MemoryStore, OntoError, QuadIndex, QuadPattern, ScopeManager};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

const PLAIN: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix ex: <http://ex.org/plant#> .

<http://ex.org/plant> a owl:Ontology ;
    rdfs:comment "A \"quoted\" comment\nover two lines" .

ex:Pump a owl:Class ;
    rdfs:label "Pump"@en , "Pumpe"@de .
ex:CentrifugalPump a owl:Class ;
    rdfs:subClassOf ex:Pump .
ex:ratedFlow a owl:DatatypeProperty ;
    rdfs:domain ex:Pump ;
    rdfs:range xsd:decimal .
ex:p101 a ex:CentrifugalPump ;
    ex:ratedFlow "12.5"^^xsd:decimal .
"#;

const WITH_BLANKS: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix ex: <http://ex.org/plant#> .

<http://ex.org/plant> a owl:Ontology .
ex:Pump a owl:Class ;
    rdfs:subClassOf [ a owl:Restriction ;
                      owl:onProperty ex:hasPart ;
                      owl:someValuesFrom [ owl:unionOf ( ex:Impeller ex:Casing ) ] ] .
ex:Impeller a owl:Class .
ex:Casing a owl:Class .
ex:hasPart a owl:ObjectProperty .
"#;

fn open_index() -> (QuadIndex, ScopeManager) {
    let mut index = QuadIndex::in_memory();
    index.open().unwrap();
    let scopes = ScopeManager::load(Arc::new(MemoryStore::new())).unwrap();
    (index, scopes)
}

fn triples(index: &QuadIndex, graph: &NamedNode) -> BTreeSet<String> {
    index
        .match_quads(&QuadPattern::any().graph(graph.clone()))
        .unwrap()
        .into_iter()
        .map(|q| format!("{} {} {}", q.subject, q.predicate, q.object))
        .collect()
}

fn named_triples(index: &QuadIndex, graph: &NamedNode) -> BTreeSet<String> {
    index
        .match_quads(&QuadPattern::any().graph(graph.clone()))
        .unwrap()
        .into_iter()
        .filter(|q| matches!(q.subject, Subject::NamedNode(_)) && !matches!(q.object, Term::BlankNode(_)))
        .map(|q| format!("{} {} {}", q.subject, q.predicate, q.object))
        .collect()
}

#[test]
fn test_plain_source_round_trips() {
    let (index, mut scopes) = open_index();
    let loaded = ontology::load(&index, &mut scopes, PLAIN, None, &ParseOptions::default()).unwrap();
    assert_eq!(loaded.graph.as_str(), "http://ex.org/plant");
    assert_eq!(loaded.prefixes.get("ex").map(String::as_str), Some("http://ex.org/plant#"));

    let turtle = ontology::serialize(&index, loaded.graph.as_ref(), &loaded.prefixes).unwrap();
    assert!(turtle.starts_with("@prefix"));
    assert!(turtle.contains("@prefix : <http://ex.org/plant> ."));
    assert!(turtle.trim_end().ends_with(&format!("ontoview-core {}", ontoview_core::VERSION)));

    let (second, mut second_scopes) = open_index();
    let reloaded = ontology::load(&second, &mut second_scopes, &turtle, None, &ParseOptions::default()).unwrap();
    assert_eq!(reloaded.graph, loaded.graph);
    assert_eq!(triples(&second, &reloaded.graph), triples(&index, &loaded.graph));
}

#[test]
fn test_blank_node_structure_survives_round_trip() {
    let (index, mut scopes) = open_index();
    let loaded = ontology::load(&index, &mut scopes, WITH_BLANKS, None, &ParseOptions::default()).unwrap();

    let turtle = ontology::serialize(&index, loaded.graph.as_ref(), &loaded.prefixes).unwrap();
    assert!(turtle.contains('('), "list should be written in collection syntax:\n{}", turtle);
    assert!(!turtle.contains("rdf:first"), "list idiom leaked:\n{}", turtle);

    let (second, mut second_scopes) = open_index();
    let reloaded = ontology::load(&second, &mut second_scopes, &turtle, None, &ParseOptions::default()).unwrap();

    assert_eq!(second.len().unwrap(), index.len().unwrap());
    assert_eq!(named_triples(&second, &reloaded.graph), named_triples(&index, &loaded.graph));
}

#[test]
fn test_syntax_error_reports_position_and_writes_nothing() {
    let (index, mut scopes) = open_index();
    let broken = "@prefix owl: <http://www.w3.org/2002/07/owl#> .\n<http://ex.org/o> a owl:Ontology ;;; .\n";

    let err = ontology::load(&index, &mut scopes, broken, None, &ParseOptions::default()).unwrap_err();
    match err {
        OntoError::ParseError { position, .. } => assert_eq!(position.map(|p| p.line), Some(2)),
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(index.is_empty().unwrap());
}

#[test]
fn test_source_without_ontology_subject_is_rejected() {
    let (index, mut scopes) = open_index();
    let err = ontology::load(
        &index,
        &mut scopes,
        "<http://ex.org/a> <http://ex.org/p> <http://ex.org/b> .",
        None,
        &ParseOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, OntoError::NoOntologySubjectFound));
}

#[test]
fn test_disk_index_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store");
    let graph;
    {
        let mut index = QuadIndex::on_disk(&path);
        index.open().unwrap();
        let mut scopes = ScopeManager::load(Arc::new(MemoryStore::new())).unwrap();
        graph = ontology::load(&index, &mut scopes, PLAIN, None, &ParseOptions::default())
            .unwrap()
            .graph;
        index.close().unwrap();
    }

    let mut index = QuadIndex::on_disk(&path);
    index.open().unwrap();
    assert!(index.graphs().unwrap().contains(&graph));
    assert!(!triples(&index, &graph).is_empty());
}
