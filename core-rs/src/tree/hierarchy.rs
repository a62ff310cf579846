/**
 * hierarchy.rs
 * Parent/child link set materialized into an ordered, cycle-safe forest
 *
 * Nodes are registered as "on stack" before their children are built, so a
 * back edge is skipped instead of recursed into. Finished subtrees are
 * memoized and cloned where a node has several parents.
 */

use std::collections::{HashMap, HashSet};

use crate::errors::Result;
use crate::tree::{sort_by_label, Labeller, ResourceTreeNode};

/// Which never-a-child nodes become roots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RootPolicy {
    /// Every node that is nobody's child
    Orphans,
    /// Only orphans that have at least one child
    OrphansWithChildren,
}

#[derive(Default)]
pub(crate) struct Hierarchy {
    /// key -> graph of origin, in registration order
    nodes: Vec<(String, String)>,
    positions: HashMap<String, usize>,
    children: HashMap<String, Vec<(String, Option<String>)>>,
    has_parent: HashSet<String>,
}

impl Hierarchy {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a node. The first graph recorded for a key is kept.
    pub(crate) fn add_node(&mut self, key: &str, graph: &str) {
        if self.positions.contains_key(key) {
            return;
        }
        self.positions.insert(key.to_string(), self.nodes.len());
        self.nodes.push((key.to_string(), graph.to_string()));
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Link two registered nodes. Self links and repeats are ignored.
    pub(crate) fn link(&mut self, parent: &str, child: &str, predicate: Option<&str>) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return;
        }
        let edges = self.children.entry(parent.to_string()).or_default();
        if edges.iter().any(|(c, _)| c == child) {
            return;
        }
        edges.push((child.to_string(), predicate.map(str::to_string)));
        self.has_parent.insert(child.to_string());
    }

    fn has_children(&self, key: &str) -> bool {
        self.children.get(key).is_some_and(|c| !c.is_empty())
    }

    fn eligible(&self, key: &str, policy: RootPolicy) -> bool {
        match policy {
            RootPolicy::Orphans => true,
            RootPolicy::OrphansWithChildren => self.has_children(key),
        }
    }

    /// Build the forest. Roots are sorted by label; children keep link order.
    pub(crate) fn materialize(
        &self,
        labeller: &mut Labeller<'_>,
        policy: RootPolicy,
    ) -> Result<Vec<ResourceTreeNode>> {
        let mut builder = Builder {
            hierarchy: self,
            labeller,
            on_stack: HashSet::new(),
            built: HashMap::new(),
        };

        let mut roots = Vec::new();
        let mut reached: HashSet<String> = HashSet::new();
        for (key, _) in &self.nodes {
            if !self.has_parent.contains(key) && self.eligible(key, policy) {
                let root = builder.build(key, None)?;
                mark_reached(&root, &mut reached);
                roots.push(root);
            }
        }

        // Nodes only reachable through a cycle
        for (key, _) in &self.nodes {
            if !reached.contains(key) && self.eligible(key, policy) && self.has_parent.contains(key) {
                let root = builder.build(key, None)?;
                mark_reached(&root, &mut reached);
                roots.push(root);
            }
        }

        sort_by_label(&mut roots);
        Ok(roots)
    }
}

fn mark_reached(node: &ResourceTreeNode, reached: &mut HashSet<String>) {
    reached.insert(node.key.clone());
    for child in &node.children {
        mark_reached(child, reached);
    }
}

struct Builder<'h, 'l, 'a> {
    hierarchy: &'h Hierarchy,
    labeller: &'l mut Labeller<'a>,
    on_stack: HashSet<String>,
    built: HashMap<String, ResourceTreeNode>,
}

impl Builder<'_, '_, '_> {
    fn build(&mut self, key: &str, parent_predicate: Option<String>) -> Result<ResourceTreeNode> {
        if let Some(done) = self.built.get(key) {
            let mut node = done.clone();
            node.parent_predicate = parent_predicate;
            return Ok(node);
        }

        let hierarchy = self.hierarchy;
        let graph = hierarchy
            .positions
            .get(key)
            .map(|&i| hierarchy.nodes[i].1.as_str())
            .unwrap_or_default();
        let mut node = self.labeller.node(key, graph, None)?;

        self.on_stack.insert(key.to_string());
        if let Some(edges) = hierarchy.children.get(key) {
            for (child, predicate) in edges {
                if self.on_stack.contains(child) {
                    continue;
                }
                node.children.push(self.build(child, predicate.clone())?);
            }
        }
        self.on_stack.remove(key);

        self.built.insert(key.to_string(), node.clone());
        node.parent_predicate = parent_predicate;
        Ok(node)
    }
}
