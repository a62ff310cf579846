//! Individuals grouped under their asserted types

use oxigraph::model::{Subject, Term};
use std::collections::{HashMap, HashSet};

use crate::errors::Result;
use crate::store::QuadPattern;
use crate::tree::{sort_by_label, ResourceTreeNode, TreeContext};
use crate::vocab::{self, rdf, NON_INDIVIDUAL_TYPES};

/// One group per type (outside the schema-level types), holding its instances
pub fn individuals_tree(context: &TreeContext<'_>) -> Result<Vec<ResourceTreeNode>> {
    let mut labeller = context.labeller();
    let mut groups: Vec<ResourceTreeNode> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut members: HashSet<(String, String)> = HashSet::new();

    for graph in context.visible {
        let typed = QuadPattern::any().predicate(rdf::TYPE).graph(graph.clone());
        for quad in context.index.match_stream(&typed)? {
            let quad = quad?;
            let (Subject::NamedNode(individual), Term::NamedNode(class)) = (&quad.subject, &quad.object) else {
                continue;
            };
            if vocab::is_one_of(class.as_str(), &NON_INDIVIDUAL_TYPES) {
                continue;
            }
            if !members.insert((class.as_str().to_string(), individual.as_str().to_string())) {
                continue;
            }

            let at = match positions.get(class.as_str()) {
                Some(&at) => at,
                None => {
                    groups.push(labeller.node(class.as_str(), graph.as_str(), None)?);
                    positions.insert(class.as_str().to_string(), groups.len() - 1);
                    groups.len() - 1
                }
            };
            let member = labeller.node(
                individual.as_str(),
                graph.as_str(),
                Some(rdf::TYPE.as_str().to_string()),
            )?;
            groups[at].children.push(member);
        }
    }

    sort_by_label(&mut groups);
    Ok(groups)
}
