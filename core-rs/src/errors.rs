//! Error types for Ontoview Core

use std::fmt;
use thiserror::Error;

/// 1-based line/column of a syntax error in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub line: u64,
    pub column: u64,
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Error, Debug)]
pub enum OntoError {
    #[error("Parse error{}: {message}", .position.map(|p| format!(" at {}", p)).unwrap_or_default())]
    ParseError {
        message: String,
        position: Option<TextSpan>,
    },

    #[error("No ontology subject found (expected a subject typed owl:Ontology, skos:ConceptScheme or voaf:Vocabulary)")]
    NoOntologySubjectFound,

    #[error("Quad index is not open")]
    NotOpen,

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    #[error("Invalid quad: {0}")]
    InvalidQuad(String),

    #[error("Scope not found: {0}")]
    ScopeNotFound(String),

    #[error("Graph not found: {0}")]
    GraphNotFound(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Source is not editable: {0}")]
    SourceNotEditable(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OntoError {
    pub fn parse(message: impl Into<String>) -> Self {
        OntoError::ParseError {
            message: message.into(),
            position: None,
        }
    }

    /// Failures that leave a previously loaded graph in place
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            OntoError::ParseError { .. }
                | OntoError::NoOntologySubjectFound
                | OntoError::NetworkFailure(_)
                | OntoError::SourceNotFound(_)
                | OntoError::Auth(_)
        )
    }
}

impl From<oxigraph::store::StorageError> for OntoError {
    fn from(err: oxigraph::store::StorageError) -> Self {
        OntoError::Storage(err.to_string())
    }
}

impl From<oxigraph::io::RdfParseError> for OntoError {
    fn from(err: oxigraph::io::RdfParseError) -> Self {
        match err {
            oxigraph::io::RdfParseError::Syntax(e) => {
                let position = e.location().map(|range| TextSpan {
                    line: range.start.line + 1,
                    column: range.start.column + 1,
                });
                OntoError::ParseError {
                    message: e.to_string(),
                    position,
                }
            }
            oxigraph::io::RdfParseError::Io(e) => OntoError::Io(e),
        }
    }
}

impl From<oxigraph::model::IriParseError> for OntoError {
    fn from(err: oxigraph::model::IriParseError) -> Self {
        OntoError::InvalidIri(err.to_string())
    }
}

impl From<reqwest::Error> for OntoError {
    fn from(err: reqwest::Error) -> Self {
        OntoError::NetworkFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OntoError>;
