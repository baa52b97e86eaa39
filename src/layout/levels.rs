use std::collections::{HashMap, HashSet, VecDeque};

use crate::ir::{GraphEdge, GraphNode};

/// Parent/child adjacency over the hierarchy subset of a graph.
#[derive(Debug, Clone, Default)]
pub struct HierarchyIndex {
    pub children: HashMap<String, Vec<String>>,
    pub parents: HashMap<String, Vec<String>>,
    /// Nodes without a hierarchy parent, in input order.
    pub roots: Vec<String>,
}

impl HierarchyIndex {
    /// Collects `parent_child` (or untyped) edges plus `parent_id` links.
    /// Duplicate pairs, self-links and links to unknown nodes are ignored.
    pub fn build(nodes: &[GraphNode], edges: &[GraphEdge]) -> Self {
        let known: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut index = Self::default();

        let links = nodes
            .iter()
            .filter_map(|node| {
                node.parent_id
                    .as_deref()
                    .map(|parent| (parent, node.id.as_str()))
            })
            .chain(
                edges
                    .iter()
                    .filter(|edge| edge.is_hierarchy())
                    .map(|edge| (edge.source.as_str(), edge.target.as_str())),
            );

        for (parent, child) in links {
            if !known.contains(parent) || !known.contains(child) {
                tracing::warn!(parent, child, "skipping hierarchy link to unknown node");
                continue;
            }
            if parent == child {
                tracing::warn!(node = child, "skipping self-referencing hierarchy link");
                continue;
            }
            if !seen.insert((parent, child)) {
                continue;
            }
            index
                .children
                .entry(parent.to_string())
                .or_default()
                .push(child.to_string());
            index
                .parents
                .entry(child.to_string())
                .or_default()
                .push(parent.to_string());
        }

        index.roots = nodes
            .iter()
            .filter(|node| !index.parents.contains_key(&node.id))
            .map(|node| node.id.clone())
            .collect();
        index
    }

    pub fn parents_of(&self, id: &str) -> &[String] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Multi-source traversal assigning every reachable node its distance from the
/// roots. A label only moves up: a node is re-labeled and re-expanded when a
/// newly found distance is not less than the recorded one, so the result is the
/// longest path from any root.
///
/// Back-edges are dropped first, so a node on a cycle gets its longest
/// simple-path depth. Each `(node, distance)` pair is expanded at most once.
pub fn label_distances(
    root_ids: &[String],
    children_of: &HashMap<String, Vec<String>>,
) -> HashMap<String, usize> {
    let (forward, dropped) = without_back_edges(root_ids, children_of);
    if dropped > 0 {
        tracing::warn!(dropped, "hierarchy contains a cycle; ignoring back-edges");
    }

    let mut levels: HashMap<String, usize> = HashMap::new();
    let mut expanded: HashSet<(String, usize)> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    for root in root_ids {
        levels.entry(root.clone()).or_insert(0);
        queue.push_back((root.clone(), 0));
    }

    while let Some((id, distance)) = queue.pop_front() {
        if levels.get(&id).is_some_and(|&current| current > distance) {
            continue;
        }
        if !expanded.insert((id.clone(), distance)) {
            continue;
        }
        let Some(children) = forward.get(&id) else {
            continue;
        };
        let next = distance + 1;
        for child in children {
            if levels.get(child).is_some_and(|&current| next < current) {
                continue;
            }
            levels.insert(child.clone(), next);
            queue.push_back((child.clone(), next));
        }
    }
    levels
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnPath,
    Done,
}

/// Depth-first colour pass from the roots keeping every edge except those
/// that point back at a node still on the current path. Returns the acyclic
/// child lists and how many edges were dropped.
fn without_back_edges(
    root_ids: &[String],
    children_of: &HashMap<String, Vec<String>>,
) -> (HashMap<String, Vec<String>>, usize) {
    let mut visits: HashMap<&str, Visit> = HashMap::new();
    let mut forward: HashMap<String, Vec<String>> = HashMap::new();
    let mut dropped = 0;

    for root in root_ids {
        if visits.contains_key(root.as_str()) {
            continue;
        }
        visits.insert(root.as_str(), Visit::OnPath);
        let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            let children = children_of.get(node).map(Vec::as_slice).unwrap_or(&[]);
            let Some(child) = children.get(cursor) else {
                visits.insert(node, Visit::Done);
                stack.pop();
                continue;
            };
            frame.1 += 1;
            match visits.get(child.as_str()) {
                Some(Visit::OnPath) => {
                    dropped += 1;
                    continue;
                }
                Some(Visit::Done) => {}
                None => {
                    visits.insert(child.as_str(), Visit::OnPath);
                    stack.push((child.as_str(), 0));
                }
            }
            forward
                .entry(node.to_string())
                .or_default()
                .push(child.clone());
        }
    }
    (forward, dropped)
}

/// Labels every node, seeding rootless components (pure cycles) from their
/// first node in input order.
pub fn label_levels(nodes: &[GraphNode], index: &HierarchyIndex) -> HashMap<String, usize> {
    let mut levels = label_distances(&index.roots, &index.children);
    for node in nodes {
        if levels.contains_key(&node.id) {
            continue;
        }
        tracing::debug!(node = %node.id, "seeding levels from a rootless component");
        let seeded = label_distances(std::slice::from_ref(&node.id), &index.children);
        for (id, level) in seeded {
            let entry = levels.entry(id).or_insert(level);
            *entry = (*entry).max(level);
        }
    }
    levels
}

/// Writes derived levels onto a copy of the nodes and returns the deepest level.
pub fn apply_levels(nodes: &[GraphNode], edges: &[GraphEdge]) -> (Vec<GraphNode>, usize) {
    let index = HierarchyIndex::build(nodes, edges);
    let levels = label_levels(nodes, &index);
    let mut max_level = 0;
    let labeled = nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            node.level = levels.get(&node.id).copied().unwrap_or(0);
            max_level = max_level.max(node.level);
            node
        })
        .collect();
    (labeled, max_level)
}
