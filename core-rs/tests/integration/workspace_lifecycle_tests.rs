//! Integration tests for the complete workspace lifecycle
//!
//! Tests a session against an in-process fake remote:
//! - Open, initialize, add sources
//! - Reload (changed, unchanged, failing)
//! - Edit, undo, redo, commit
//! - Close and reopen from the persisted settings

use oxigraph::model::{Literal, NamedNode, Quad, Subject, Term};
use ontoview_core::drivers::{CommitRequest, HttpFetcher, SourceControl};
use ontoview_core::{JsonFileStore, KeyValueStore, OntoError, OntologyWorkspace, Result, WorkspaceConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const PLANT_URL: &str = "https://github.com/acme/plant/blob/main/ontology/plant.ttl";
const UNITS_URL: &str = "https://example.org/units.ttl";

const PLANT_V1: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix vann: <http://purl.org/vocab/vann/> .
@prefix pl: <http://ex.org/plant#> .

<http://ex.org/plant> a owl:Ontology ; vann:preferredNamespacePrefix "pl" .
pl:Equipment a owl:Class ; rdfs:label "Equipment"@en .
pl:Pump a owl:Class ; rdfs:label "Pump"@en ; rdfs:subClassOf pl:Equipment ,
    [ a owl:Restriction ; owl:onProperty pl:hasPart ; owl:someValuesFrom pl:Impeller ] .
pl:Impeller a owl:Class ; rdfs:label "Impeller"@en .
pl:hasPart a owl:ObjectProperty ; rdfs:label "has part"@en .
pl:p101 a pl:Pump ; rdfs:label "P-101"@en .
"#;

const PLANT_V2: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix pl: <http://ex.org/plant#> .

<http://ex.org/plant> a owl:Ontology .
pl:Equipment a owl:Class .
pl:Valve a owl:Class ; rdfs:subClassOf pl:Equipment .
"#;

const UNITS: &str = r#"
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
<http://ex.org/units> a skos:ConceptScheme .
<http://ex.org/units#Metre> a skos:Concept ; skos:prefLabel "metre"@en .
"#;

/// Fake GitHub + HTTP remote with scripted revisions
#[derive(Clone, Default)]
struct FakeRemote {
    state: Arc<Mutex<RemoteState>>,
}

#[derive(Default)]
struct RemoteState {
    files: HashMap<String, String>,
    revision: u32,
    content_fetches: usize,
    offline: bool,
    commits: Vec<(String, String)>,
}

impl FakeRemote {
    fn publish(&self, path: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        state.files.insert(path.to_string(), content.to_string());
        state.revision += 1;
    }

    fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    fn content_fetches(&self) -> usize {
        self.state.lock().unwrap().content_fetches
    }
}

impl SourceControl for FakeRemote {
    async fn get_file_content(&self, _owner: &str, _repo: &str, path: &str, _reference: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(OntoError::NetworkFailure("connection refused".to_string()));
        }
        state.content_fetches += 1;
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| OntoError::SourceNotFound(path.to_string()))
    }

    async fn commit_file(&self, request: CommitRequest<'_>) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.files.insert(request.path.to_string(), request.content.to_string());
        state.commits.push((request.path.to_string(), request.message.to_string()));
        state.revision += 1;
        Ok(format!("rev-{}", state.revision))
    }

    async fn get_latest_revision_id(&self, _owner: &str, _repo: &str, _path: &str, _reference: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(OntoError::NetworkFailure("connection refused".to_string()));
        }
        Ok(format!("rev-{}", state.revision))
    }
}

impl HttpFetcher for FakeRemote {
    async fn get_text(&self, url: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(OntoError::NetworkFailure("connection refused".to_string()));
        }
        match url {
            UNITS_URL => Ok(UNITS.to_string()),
            _ => Err(OntoError::SourceNotFound(url.to_string())),
        }
    }
}

fn config(temp: &TempDir) -> WorkspaceConfig {
    WorkspaceConfig {
        data_dir: temp.path().to_path_buf(),
        ..WorkspaceConfig::default()
    }
}

fn open(temp: &TempDir, remote: &FakeRemote) -> OntologyWorkspace<FakeRemote> {
    let config = config(temp);
    let settings: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(config.settings_path()).unwrap());
    OntologyWorkspace::open(&config, settings, remote.clone()).unwrap()
}

fn keys(nodes: &[ontoview_core::ResourceTreeNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.key.as_str()).collect()
}

#[tokio::test]
async fn test_complete_workspace_lifecycle() {
    let temp = TempDir::new().unwrap();
    let remote = FakeRemote::default();
    remote.publish("ontology/plant.ttl", PLANT_V1);

    // 1. Open and initialize an empty workspace
    let mut ws = open(&temp, &remote);
    ws.initialize().await.unwrap();
    assert!(ws.sources().is_empty());
    assert_eq!(ws.label("http://www.w3.org/2002/07/owl#Class").unwrap(), "Class");

    // 2. Add a GitHub source and an HTTP source
    let plant = ws.add_source(PLANT_URL).await.unwrap();
    assert!(plant.is_editable());
    assert_eq!(plant.path.as_deref(), Some("ontology/plant.ttl"));
    let units = ws.add_source(UNITS_URL).await.unwrap();
    assert!(!units.is_editable());
    assert_eq!(ws.visible_graphs().len(), 2);

    // 3. Derived views
    let classes = ws.class_tree().unwrap();
    assert_eq!(keys(&classes), vec!["http://ex.org/plant#Equipment", "http://ex.org/plant#Impeller"]);
    assert_eq!(classes[0].children[0].key, "http://ex.org/plant#Pump");
    assert_eq!(classes[0].children[0].prefixed_iri, "pl:Pump");

    let parts = ws.decomposition_tree().unwrap();
    assert_eq!(keys(&parts), vec!["http://ex.org/plant#Pump"]);
    assert_eq!(parts[0].children[0].key, "http://ex.org/plant#Impeller");

    let individuals = ws.individuals_tree().unwrap();
    let pump_group = individuals.iter().find(|n| n.key == "http://ex.org/plant#Pump").unwrap();
    assert_eq!(pump_group.children[0].label, "P-101");

    assert_eq!(ws.label("http://ex.org/units#Metre").unwrap(), "metre");
    assert!(ws
        .suggest("impel", 10)
        .unwrap()
        .contains(&"http://ex.org/plant#Impeller".to_string()));

    // 4. Close and reopen: sources, visibility and scopes come back
    let scope = plant.scope.clone().unwrap();
    ws.close().unwrap();
    drop(ws);

    let mut ws = open(&temp, &remote);
    ws.initialize().await.unwrap();
    assert_eq!(ws.sources().len(), 2);
    assert_eq!(ws.source(PLANT_URL).unwrap().scope.as_ref(), Some(&scope));
    assert_eq!(remote.content_fetches(), 1, "unchanged revision must not be re-fetched");
    assert_eq!(ws.class_tree().unwrap().len(), 2);
}

#[tokio::test]
async fn test_reload_replaces_graph_and_keeps_it_on_failure() {
    let temp = TempDir::new().unwrap();
    let remote = FakeRemote::default();
    remote.publish("ontology/plant.ttl", PLANT_V1);

    let mut ws = open(&temp, &remote);
    ws.initialize().await.unwrap();
    ws.add_source(PLANT_URL).await.unwrap();

    // New revision: old quads are gone, new ones are in
    remote.publish("ontology/plant.ttl", PLANT_V2);
    let details = ws.reload_source(PLANT_URL).await.unwrap();
    assert_eq!(details.revision.as_deref(), Some("rev-2"));
    let classes = ws.class_tree().unwrap();
    assert_eq!(keys(&classes), vec!["http://ex.org/plant#Equipment"]);
    assert_eq!(classes[0].children[0].key, "http://ex.org/plant#Valve");
    assert!(ws.subject_quads("http://ex.org/plant#Pump").unwrap().is_empty());

    // Network failure: recorded, previous graph untouched
    remote.set_offline(true);
    let err = ws.reload_source(PLANT_URL).await.unwrap_err();
    assert!(matches!(err, OntoError::NetworkFailure(_)));
    let details = ws.source(PLANT_URL).unwrap();
    assert!(!details.loaded);
    assert!(details.error.as_deref().unwrap().contains("connection refused"));
    assert_eq!(ws.class_tree().unwrap()[0].children[0].key, "http://ex.org/plant#Valve");

    // Parse failure: same guarantees
    remote.set_offline(false);
    remote.publish("ontology/plant.ttl", "this is not turtle");
    let err = ws.reload_source(PLANT_URL).await.unwrap_err();
    assert!(matches!(err, OntoError::ParseError { .. }));
    assert_eq!(ws.class_tree().unwrap()[0].children[0].key, "http://ex.org/plant#Valve");

    // Recovery clears the error
    remote.publish("ontology/plant.ttl", PLANT_V1);
    let details = ws.reload_source(PLANT_URL).await.unwrap();
    assert!(details.loaded);
    assert!(details.error.is_none());
}

#[tokio::test]
async fn test_edit_undo_redo_and_commit() {
    let temp = TempDir::new().unwrap();
    let remote = FakeRemote::default();
    remote.publish("ontology/plant.ttl", PLANT_V1);

    let mut ws = open(&temp, &remote);
    ws.initialize().await.unwrap();
    ws.add_source(PLANT_URL).await.unwrap();
    let graph = NamedNode::new("http://ex.org/plant").unwrap();
    let label_of = |iri: &str, value: &str| {
        Quad::new(
            NamedNode::new(iri).unwrap(),
            NamedNode::new("http://www.w3.org/2000/01/rdf-schema#label").unwrap(),
            Literal::new_language_tagged_literal(value, "en").unwrap(),
            graph.clone(),
        )
    };

    // Edit a label, undo, redo
    ws.edit_quad(
        label_of("http://ex.org/plant#Pump", "Pump"),
        label_of("http://ex.org/plant#Pump", "Rotary pump"),
    )
    .unwrap();
    assert_eq!(ws.label("http://ex.org/plant#Pump").unwrap(), "Rotary pump");
    ws.undo().unwrap();
    ws.undo().unwrap();
    assert_eq!(ws.label("http://ex.org/plant#Pump").unwrap(), "Pump");
    ws.redo().unwrap();
    ws.redo().unwrap();
    assert_eq!(ws.label("http://ex.org/plant#Pump").unwrap(), "Rotary pump");

    // Minted blank nodes never collide with ingested ones
    let blank = ws.new_blank_node(PLANT_URL).unwrap();
    let ingested: Vec<String> = ws
        .subject_quads("http://ex.org/plant#Pump")
        .unwrap()
        .into_iter()
        .filter_map(|q| match q.object {
            Term::BlankNode(b) => Some(b.as_str().to_string()),
            _ => None,
        })
        .collect();
    assert!(!ingested.is_empty());
    assert!(!ingested.contains(&blank.as_str().to_string()));
    ws.add_quad(Quad::new(
        Subject::BlankNode(blank),
        NamedNode::new("http://www.w3.org/2000/01/rdf-schema#comment").unwrap(),
        Literal::new_simple_literal("added"),
        graph.clone(),
    ))
    .unwrap();

    // Edits to graphs outside the workspace are refused
    let foreign = Quad::new(
        NamedNode::new("http://ex.org/x").unwrap(),
        NamedNode::new("http://ex.org/p").unwrap(),
        Literal::new_simple_literal("v"),
        NamedNode::new("http://ex.org/nowhere").unwrap(),
    );
    assert!(matches!(ws.add_quad(foreign), Err(OntoError::GraphNotFound(_))));

    // Commit writes the serialized graph back
    let turtle = ws.serialize(PLANT_URL).unwrap();
    assert!(turtle.contains("Rotary pump"));
    let revision = ws.commit(PLANT_URL, "Rename pump").await.unwrap();
    assert_eq!(ws.source(PLANT_URL).unwrap().revision.as_deref(), Some(revision.as_str()));
    let state = remote.state.lock().unwrap();
    assert_eq!(state.commits, vec![("ontology/plant.ttl".to_string(), "Rename pump".to_string())]);
    assert!(state.files["ontology/plant.ttl"].contains("Rotary pump"));
}

#[tokio::test]
async fn test_remove_source_forgets_graph_and_scope() {
    let temp = TempDir::new().unwrap();
    let remote = FakeRemote::default();
    remote.publish("ontology/plant.ttl", PLANT_V1);

    let mut ws = open(&temp, &remote);
    ws.initialize().await.unwrap();
    ws.add_source(PLANT_URL).await.unwrap();
    ws.remove_source(PLANT_URL).unwrap();

    assert!(ws.sources().is_empty());
    assert!(ws.class_tree().unwrap().is_empty());
    assert!(ws.subject_quads("http://ex.org/plant#Pump").unwrap().is_empty());
    assert!(matches!(ws.remove_source(PLANT_URL), Err(OntoError::SourceNotFound(_))));
    assert!(matches!(ws.serialize(PLANT_URL), Err(OntoError::SourceNotFound(_))));
}
