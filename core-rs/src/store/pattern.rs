//! Quad patterns: any subset of subject, predicate, object and graph may be bound

use oxigraph::model::{
    GraphNameRef, NamedNode, NamedNodeRef, Quad, Subject, SubjectRef, Term, TermRef,
};

/// A quad pattern. Unbound positions match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadPattern {
    pub subject: Option<Subject>,
    pub predicate: Option<NamedNode>,
    pub object: Option<Term>,
    pub graph: Option<NamedNode>,
}

impl QuadPattern {
    /// Pattern matching every quad in the index
    pub fn any() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl Into<Subject>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn predicate(mut self, predicate: impl Into<NamedNode>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn graph(mut self, graph: impl Into<NamedNode>) -> Self {
        self.graph = Some(graph.into());
        self
    }

    /// Pattern that matches exactly this quad
    pub fn exact(quad: &Quad) -> Option<Self> {
        let oxigraph::model::GraphName::NamedNode(graph) = &quad.graph_name else {
            return None;
        };
        Some(Self {
            subject: Some(quad.subject.clone()),
            predicate: Some(quad.predicate.clone()),
            object: Some(quad.object.clone()),
            graph: Some(graph.clone()),
        })
    }

    pub fn is_unbound(&self) -> bool {
        self.subject.is_none() && self.predicate.is_none() && self.object.is_none() && self.graph.is_none()
    }

    pub(crate) fn subject_ref(&self) -> Option<SubjectRef<'_>> {
        self.subject.as_ref().map(Subject::as_ref)
    }

    pub(crate) fn predicate_ref(&self) -> Option<NamedNodeRef<'_>> {
        self.predicate.as_ref().map(NamedNode::as_ref)
    }

    pub(crate) fn object_ref(&self) -> Option<TermRef<'_>> {
        self.object.as_ref().map(Term::as_ref)
    }

    pub(crate) fn graph_ref(&self) -> Option<GraphNameRef<'_>> {
        self.graph.as_ref().map(|g| GraphNameRef::NamedNode(g.as_ref()))
    }
}
