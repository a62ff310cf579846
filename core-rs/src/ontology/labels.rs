//! Display labels for IRIs

use oxigraph::model::{NamedNode, Term};

use crate::errors::Result;
use crate::store::{QuadIndex, QuadPattern};
use crate::vocab::{LABEL_LANGUAGE, LABEL_PREDICATES};

/// English label of `iri`, or its local name when none is stored
pub fn label(index: &QuadIndex, iri: &str) -> Result<String> {
    if let Ok(subject) = NamedNode::new(iri) {
        for predicate in LABEL_PREDICATES {
            let pattern = QuadPattern::any().subject(subject.clone()).predicate(predicate);
            for quad in index.match_stream(&pattern)? {
                if let Term::Literal(literal) = quad?.object {
                    if literal
                        .language()
                        .is_some_and(|lang| lang.eq_ignore_ascii_case(LABEL_LANGUAGE))
                    {
                        return Ok(literal.value().to_string());
                    }
                }
            }
        }
    }
    Ok(local_name(iri).to_string())
}

/// Text after the last `#`, else after the last `/`, else the whole IRI
pub fn local_name(iri: &str) -> &str {
    let tail = match iri.rfind('#').or_else(|| iri.rfind('/')) {
        Some(pos) => &iri[pos + 1..],
        None => iri,
    };
    if tail.is_empty() {
        iri
    } else {
        tail
    }
}
