/**
 * decomposition.rs
 * Part-whole tree from has-part restrictions and shapes
 *
 * A has-part property is any owl:ObjectProperty or rdf:Property whose local
 * name contains "haspart" (case-insensitive). Structures read:
 *
 *   Whole rdfs:subClassOf [ owl:onProperty hasPart ; owl:someValuesFrom Part ]
 *   (also owl:allValuesFrom, owl:onClass, and owl:unionOf of named parts)
 *
 *   Whole sh:property [ sh:path hasPart ; sh:class Part ]
 *
 * Roots are wholes that are never a part and have at least one part.
 */

use oxigraph::model::{NamedNode, Subject, Term};
use std::collections::HashSet;

use crate::errors::Result;
use crate::ontology::labels::local_name;
use crate::store::QuadPattern;
use crate::tree::hierarchy::{Hierarchy, RootPolicy};
use crate::tree::{list_members, ResourceTreeNode, TreeContext};
use crate::vocab::{owl, rdf, rdfs, sh, PART_PROPERTY_MARKERS};

const PART_TARGETS: [oxigraph::model::NamedNodeRef<'static>; 3] =
    [owl::SOME_VALUES_FROM, owl::ALL_VALUES_FROM, owl::ON_CLASS];

pub fn decomposition_tree(context: &TreeContext<'_>) -> Result<Vec<ResourceTreeNode>> {
    if context.visible.is_empty() {
        return Ok(Vec::new());
    }

    let mut hierarchy = Hierarchy::new();
    for property in has_part_properties(context)? {
        for graph in context.visible {
            link_restrictions(context, &mut hierarchy, &property, graph)?;
            link_shapes(context, &mut hierarchy, &property, graph)?;
        }
    }
    hierarchy.materialize(&mut context.labeller(), RootPolicy::OrphansWithChildren)
}

/// Has-part properties declared in any loaded graph
fn has_part_properties(context: &TreeContext<'_>) -> Result<Vec<NamedNode>> {
    let mut seen = HashSet::new();
    let mut properties = Vec::new();
    for marker in PART_PROPERTY_MARKERS {
        let pattern = QuadPattern::any().predicate(rdf::TYPE).object(marker);
        for quad in context.index.match_stream(&pattern)? {
            if let Subject::NamedNode(property) = quad?.subject {
                if is_has_part(property.as_str()) && seen.insert(property.clone()) {
                    properties.push(property);
                }
            }
        }
    }
    Ok(properties)
}

pub(crate) fn is_has_part(iri: &str) -> bool {
    local_name(iri).to_ascii_lowercase().contains("haspart")
}

fn link_restrictions(
    context: &TreeContext<'_>,
    hierarchy: &mut Hierarchy,
    property: &NamedNode,
    graph: &NamedNode,
) -> Result<()> {
    let on_property = QuadPattern::any()
        .predicate(owl::ON_PROPERTY)
        .object(property.clone())
        .graph(graph.clone());
    for quad in context.index.match_stream(&on_property)? {
        let restriction = quad?.subject;

        let mut parts = Vec::new();
        for target in PART_TARGETS {
            let pattern = QuadPattern::any().subject(restriction.clone()).predicate(target);
            for quad in context.index.match_stream(&pattern)? {
                parts.extend(named_classes(context, quad?.object)?);
            }
        }

        let parents = QuadPattern::any()
            .predicate(rdfs::SUB_CLASS_OF)
            .object(Term::from(restriction.clone()))
            .graph(graph.clone());
        let wholes = named_subjects(context, &parents)?;
        link_all(hierarchy, &wholes, &parts, property, graph);
    }
    Ok(())
}

fn link_shapes(
    context: &TreeContext<'_>,
    hierarchy: &mut Hierarchy,
    property: &NamedNode,
    graph: &NamedNode,
) -> Result<()> {
    let on_path = QuadPattern::any()
        .predicate(sh::PATH)
        .object(property.clone())
        .graph(graph.clone());
    for quad in context.index.match_stream(&on_path)? {
        let shape = quad?.subject;

        let mut parts = Vec::new();
        let pattern = QuadPattern::any().subject(shape.clone()).predicate(sh::CLASS);
        for quad in context.index.match_stream(&pattern)? {
            parts.extend(named_classes(context, quad?.object)?);
        }

        let parents = QuadPattern::any()
            .predicate(sh::PROPERTY)
            .object(Term::from(shape.clone()))
            .graph(graph.clone());
        let wholes = named_subjects(context, &parents)?;
        link_all(hierarchy, &wholes, &parts, property, graph);
    }
    Ok(())
}

/// A named class, or the named members of an anonymous owl:unionOf
fn named_classes(context: &TreeContext<'_>, target: Term) -> Result<Vec<NamedNode>> {
    match target {
        Term::NamedNode(class) => Ok(vec![class]),
        Term::BlankNode(expression) => {
            let union = QuadPattern::any().subject(expression).predicate(owl::UNION_OF);
            let mut classes = Vec::new();
            for quad in context.index.match_stream(&union)? {
                for member in list_members(context.index, &quad?.object)? {
                    if let Term::NamedNode(class) = member {
                        classes.push(class);
                    }
                }
            }
            Ok(classes)
        }
        _ => Ok(Vec::new()),
    }
}

fn named_subjects(context: &TreeContext<'_>, pattern: &QuadPattern) -> Result<Vec<NamedNode>> {
    let mut subjects = Vec::new();
    for quad in context.index.match_stream(pattern)? {
        if let Subject::NamedNode(subject) = quad?.subject {
            subjects.push(subject);
        }
    }
    Ok(subjects)
}

fn link_all(
    hierarchy: &mut Hierarchy,
    wholes: &[NamedNode],
    parts: &[NamedNode],
    property: &NamedNode,
    graph: &NamedNode,
) {
    for whole in wholes {
        hierarchy.add_node(whole.as_str(), graph.as_str());
        for part in parts {
            hierarchy.add_node(part.as_str(), graph.as_str());
            hierarchy.link(whole.as_str(), part.as_str(), Some(property.as_str()));
        }
    }
}
