//! Class and property trees

use oxigraph::model::{NamedNodeRef, Subject, Term};

use crate::errors::Result;
use crate::store::QuadPattern;
use crate::tree::hierarchy::{Hierarchy, RootPolicy};
use crate::tree::{list_members, ResourceTreeNode, TreeContext};
use crate::vocab::{owl, rdfs, CLASS_MARKERS, PROPERTY_MARKERS};

/// Classes arranged by rdfs:subClassOf, with intersection members as extra parents
pub fn class_tree(context: &TreeContext<'_>) -> Result<Vec<ResourceTreeNode>> {
    if context.visible.is_empty() {
        return Ok(Vec::new());
    }
    let mut hierarchy = seeded(context, &CLASS_MARKERS)?;
    link_direct(context, &mut hierarchy, rdfs::SUB_CLASS_OF)?;
    link_intersections(context, &mut hierarchy)?;
    hierarchy.materialize(&mut context.labeller(), RootPolicy::Orphans)
}

/// Properties arranged by rdfs:subPropertyOf
pub fn property_tree(context: &TreeContext<'_>) -> Result<Vec<ResourceTreeNode>> {
    if context.visible.is_empty() {
        return Ok(Vec::new());
    }
    let mut hierarchy = seeded(context, &PROPERTY_MARKERS)?;
    link_direct(context, &mut hierarchy, rdfs::SUB_PROPERTY_OF)?;
    hierarchy.materialize(&mut context.labeller(), RootPolicy::Orphans)
}

fn seeded(context: &TreeContext<'_>, markers: &[NamedNodeRef<'static>]) -> Result<Hierarchy> {
    let mut hierarchy = Hierarchy::new();
    for (subject, graph) in context.typed_subjects(markers)? {
        hierarchy.add_node(subject.as_str(), graph.as_str());
    }
    Ok(hierarchy)
}

/// `child predicate parent` quads between seeds, from visible graphs only
fn link_direct(
    context: &TreeContext<'_>,
    hierarchy: &mut Hierarchy,
    predicate: NamedNodeRef<'static>,
) -> Result<()> {
    for graph in context.visible {
        let pattern = QuadPattern::any().predicate(predicate).graph(graph.clone());
        for quad in context.index.match_stream(&pattern)? {
            let quad = quad?;
            if let (Subject::NamedNode(child), Term::NamedNode(parent)) = (&quad.subject, &quad.object) {
                hierarchy.link(parent.as_str(), child.as_str(), Some(predicate.as_str()));
            }
        }
    }
    Ok(())
}

/// `C subClassOf|equivalentClass [ owl:intersectionOf ( A ... ) ]` makes C a child of each A
fn link_intersections(context: &TreeContext<'_>, hierarchy: &mut Hierarchy) -> Result<()> {
    for graph in context.visible {
        for relation in [rdfs::SUB_CLASS_OF, owl::EQUIVALENT_CLASS] {
            let pattern = QuadPattern::any().predicate(relation).graph(graph.clone());
            for quad in context.index.match_stream(&pattern)? {
                let quad = quad?;
                let (Subject::NamedNode(child), Term::BlankNode(expression)) = (&quad.subject, &quad.object) else {
                    continue;
                };
                let operands = QuadPattern::any()
                    .subject(expression.clone())
                    .predicate(owl::INTERSECTION_OF);
                for list in context.index.match_stream(&operands)? {
                    for member in list_members(context.index, &list?.object)? {
                        if let Term::NamedNode(parent) = member {
                            hierarchy.link(parent.as_str(), child.as_str(), Some(owl::INTERSECTION_OF.as_str()));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
