/**
 * query.rs
 * Per-resource lookups used by detail views and editors
 *
 * All lookups run across every graph in the index, built-ins included.
 * Results are de-duplicated and keep first-seen order.
 */

use oxigraph::model::{NamedNode, Quad, Subject, Term};
use std::collections::HashSet;

use crate::errors::Result;
use crate::ontology::prefixes::PrefixRegistry;
use crate::store::{QuadIndex, QuadPattern};
use crate::vocab::{owl, rdf, rdfs, sh};

fn distinct(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}

fn named_subjects(index: &QuadIndex, pattern: &QuadPattern) -> Result<Vec<String>> {
    let mut found = Vec::new();
    for quad in index.match_stream(pattern)? {
        if let Subject::NamedNode(s) = quad?.subject {
            found.push(s.into_string());
        }
    }
    Ok(distinct(found))
}

fn node(iri: &str) -> Result<NamedNode> {
    Ok(NamedNode::new(iri)?)
}

/// Properties whose `rdfs:domain` is `class`
pub fn domain_properties(index: &QuadIndex, class: &str) -> Result<Vec<String>> {
    named_subjects(
        index,
        &QuadPattern::any().predicate(rdfs::DOMAIN).object(node(class)?),
    )
}

/// Named subjects typed `class`
pub fn instances(index: &QuadIndex, class: &str) -> Result<Vec<String>> {
    named_subjects(index, &QuadPattern::any().predicate(rdf::TYPE).object(node(class)?))
}

/// Objects of `rdfs:range` on `property`, named or anonymous
pub fn ranges(index: &QuadIndex, property: &str) -> Result<Vec<Term>> {
    let pattern = QuadPattern::any().subject(node(property)?).predicate(rdfs::RANGE);
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for quad in index.match_stream(&pattern)? {
        let object = quad?.object;
        if seen.insert(object.clone()) {
            found.push(object);
        }
    }
    Ok(found)
}

/// Properties restricted by anonymous superclasses of `class` (`owl:onProperty`)
pub fn restricted_properties(index: &QuadIndex, class: &str) -> Result<Vec<String>> {
    let pattern = QuadPattern::any().subject(node(class)?).predicate(rdfs::SUB_CLASS_OF);
    let mut found = Vec::new();
    for quad in index.match_quads(&pattern)? {
        let Term::BlankNode(restriction) = quad.object else {
            continue;
        };
        let on_property = QuadPattern::any().subject(restriction).predicate(owl::ON_PROPERTY);
        for quad in index.match_stream(&on_property)? {
            if let Term::NamedNode(property) = quad?.object {
                found.push(property.into_string());
            }
        }
    }
    Ok(distinct(found))
}

/// A value constraint on the `rdf:value` of a range: `allValuesFrom`,
/// `someValuesFrom` or `hasValue` of an `owl:Restriction` on `rdf:value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRestriction {
    pub restriction: Term,
    pub predicate: NamedNode,
    pub filler: Term,
}

const VALUE_FILLERS: [oxigraph::model::NamedNodeRef<'static>; 3] =
    [owl::ALL_VALUES_FROM, owl::SOME_VALUES_FROM, owl::HAS_VALUE];

/// Value restrictions carried by `target`
///
/// An anonymous `target` (typically a `ranges` result) is checked itself;
/// a named one is checked through its anonymous `rdfs:subClassOf` objects.
/// Each restriction contributes its first filler, in `VALUE_FILLERS` order.
pub fn value_restrictions(index: &QuadIndex, target: &Term) -> Result<Vec<ValueRestriction>> {
    let candidates: Vec<Subject> = match target {
        Term::BlankNode(b) => vec![Subject::BlankNode(b.clone())],
        Term::NamedNode(class) => {
            let pattern = QuadPattern::any().subject(class.clone()).predicate(rdfs::SUB_CLASS_OF);
            let mut found = Vec::new();
            for quad in index.match_stream(&pattern)? {
                if let Term::BlankNode(b) = quad?.object {
                    found.push(Subject::BlankNode(b));
                }
            }
            found
        }
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut restrictions = Vec::new();
    for candidate in candidates {
        if !seen.insert(candidate.clone()) {
            continue;
        }
        let is_restriction = index.has_any(
            &QuadPattern::any()
                .subject(candidate.clone())
                .predicate(rdf::TYPE)
                .object(owl::RESTRICTION),
        )?;
        let on_value = index.has_any(
            &QuadPattern::any()
                .subject(candidate.clone())
                .predicate(owl::ON_PROPERTY)
                .object(rdf::VALUE),
        )?;
        if !(is_restriction && on_value) {
            continue;
        }

        for predicate in VALUE_FILLERS {
            let pattern = QuadPattern::any().subject(candidate.clone()).predicate(predicate);
            if let Some(quad) = index.match_stream(&pattern)?.next() {
                restrictions.push(ValueRestriction {
                    restriction: Term::from(candidate.clone()),
                    predicate: predicate.into_owned(),
                    filler: quad?.object,
                });
                break;
            }
        }
    }
    Ok(restrictions)
}

/// `rdf:type` values of `iri` in prefixed form
pub fn rdf_types(index: &QuadIndex, prefixes: &PrefixRegistry, iri: &str) -> Result<Vec<String>> {
    let pattern = QuadPattern::any().subject(node(iri)?).predicate(rdf::TYPE);
    let mut found = Vec::new();
    for quad in index.match_stream(&pattern)? {
        if let Term::NamedNode(t) = quad?.object {
            found.push(prefixes.prefixed_form(t.as_str()));
        }
    }
    Ok(distinct(found))
}

/// `sh:property` quads of a node shape
pub fn shacl_property_quads(index: &QuadIndex, shape: &str) -> Result<Vec<Quad>> {
    index.match_quads(&QuadPattern::any().subject(node(shape)?).predicate(sh::PROPERTY))
}

/// Every IRI used as a subject or object anywhere in the index
pub fn named_nodes(index: &QuadIndex) -> Result<Vec<String>> {
    let mut found = Vec::new();
    for quad in index.match_stream(&QuadPattern::any())? {
        let quad = quad?;
        if let Subject::NamedNode(s) = quad.subject {
            found.push(s.into_string());
        }
        if let Term::NamedNode(o) = quad.object {
            found.push(o.into_string());
        }
    }
    Ok(distinct(found))
}
