use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};

use super::handles::assign_handles;
use super::types::{BoxSize, LayoutResult};
use crate::config::LayoutConfig;
use crate::ir::{Direction, GraphEdge, GraphNode, Position};

/// Box size and spacing handed to the ranker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    pub direction: Direction,
    pub node_width: f32,
    pub node_height: f32,
    pub node_separation: f32,
    pub rank_separation: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    pub order_passes: usize,
}

impl RankOptions {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            direction: config.rank.direction,
            node_width: config.node_width,
            node_height: config.node_height,
            node_separation: config.rank.node_separation,
            rank_separation: config.rank.rank_separation,
            margin_x: config.rank.margin_x,
            margin_y: config.rank.margin_y,
            order_passes: config.rank.order_passes,
        }
    }

    pub fn node_box(&self) -> BoxSize {
        BoxSize::new(self.node_width, self.node_height)
    }
}

impl Default for RankOptions {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

/// Sugiyama-style placement: ranks along the primary axis, crossing-reduced
/// order within each rank. Positions are box top-left corners. Inputs are not
/// mutated; an empty node list comes back unchanged.
pub fn rank_layout(nodes: &[GraphNode], edges: &[GraphEdge], options: &RankOptions) -> LayoutResult {
    if nodes.is_empty() {
        return LayoutResult::new(Vec::new(), edges.to_vec());
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    let node_ids: Vec<String> = nodes
        .iter()
        .filter(|node| seen_ids.insert(node.id.as_str()))
        .map(|node| node.id.clone())
        .collect();
    let layout_edges = layout_edge_pairs(&seen_ids, edges);

    let mut placed = assign_positions_dagre(&node_ids, &layout_edges, options);
    if placed.len() < node_ids.len() {
        tracing::debug!(
            placed = placed.len(),
            nodes = node_ids.len(),
            "dagre left nodes unplaced; using built-in ranking"
        );
        placed = assign_positions_manual(&node_ids, &layout_edges, options);
    }

    let positioned: Vec<GraphNode> = nodes
        .iter()
        .map(|node| GraphNode {
            position: placed.get(&node.id).copied().unwrap_or(node.position),
            ..node.clone()
        })
        .collect();
    let edges = assign_handles(edges, &positioned);
    LayoutResult::new(positioned, edges)
}

/// Distinct (source, target) pairs between known nodes, in input order.
fn layout_edge_pairs(known: &HashSet<&str>, edges: &[GraphEdge]) -> Vec<(String, String)> {
    let mut edge_set: HashSet<(&str, &str)> = HashSet::new();
    let mut pairs = Vec::new();
    let mut skipped = 0usize;
    for edge in edges {
        let (from, to) = (edge.source.as_str(), edge.target.as_str());
        if !known.contains(from) || !known.contains(to) {
            skipped += 1;
            continue;
        }
        if from == to || !edge_set.insert((from, to)) {
            continue;
        }
        pairs.push((from.to_string(), to.to_string()));
    }
    if skipped > 0 {
        tracing::warn!(skipped, "ignoring edges that reference missing nodes");
    }
    pairs
}

fn dagre_rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::TopBottom => "tb",
        Direction::BottomTop => "bt",
        Direction::LeftRight => "lr",
        Direction::RightLeft => "rl",
    }
}

fn assign_positions_dagre(
    node_ids: &[String],
    edges: &[(String, String)],
    options: &RankOptions,
) -> HashMap<String, Position> {
    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some(dagre_rankdir(options.direction).to_string());
    graph_config.nodesep = Some(options.node_separation);
    graph_config.ranksep = Some(options.rank_separation);
    graph_config.marginx = Some(options.margin_x);
    graph_config.marginy = Some(options.margin_y);
    dagre_graph.set_graph(graph_config);

    for node_id in node_ids {
        let mut node = DagreNode::default();
        node.width = options.node_width;
        node.height = options.node_height;
        dagre_graph.set_node(node_id.clone(), Some(node));
    }

    for (from, to) in edges {
        let edge_label = DagreEdge::default();
        let _ = dagre_graph.set_edge(from, to, Some(edge_label), None);
    }

    dagre_layout::run_layout(&mut dagre_graph);

    let mut placed = HashMap::new();
    for node_id in node_ids {
        let Some(dagre_node) = dagre_graph.node(node_id) else {
            continue;
        };
        if !dagre_node.x.is_finite() || !dagre_node.y.is_finite() {
            continue;
        }
        placed.insert(
            node_id.clone(),
            Position::new(
                dagre_node.x - options.node_width / 2.0,
                dagre_node.y - options.node_height / 2.0,
            ),
        );
    }
    placed
}

fn assign_positions_manual(
    node_ids: &[String],
    edges: &[(String, String)],
    options: &RankOptions,
) -> HashMap<String, Position> {
    let node_order: HashMap<String, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect();
    let ranks = compute_ranks(node_ids, edges, &node_order);
    let max_rank = ranks.values().copied().max().unwrap_or(0);

    let mut rank_nodes: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
    for node_id in node_ids {
        let rank = ranks.get(node_id).copied().unwrap_or(0);
        rank_nodes[rank].push(node_id.clone());
    }
    order_rank_nodes(&mut rank_nodes, edges, &node_order, options.order_passes);

    let horizontal = options.direction.is_horizontal();
    let (along, across) = if horizontal {
        (options.node_width, options.node_height)
    } else {
        (options.node_height, options.node_width)
    };
    let rank_step = along + options.rank_separation;
    let slot_step = across + options.node_separation;
    let widest = rank_nodes.iter().map(Vec::len).max().unwrap_or(0);
    let reversed = matches!(options.direction, Direction::BottomTop | Direction::RightLeft);

    let mut placed = HashMap::new();
    for (rank, bucket) in rank_nodes.iter().enumerate() {
        let rank_idx = if reversed { max_rank - rank } else { rank };
        let main = rank_idx as f32 * rank_step;
        let offset = (widest - bucket.len()) as f32 * slot_step / 2.0;
        for (slot, node_id) in bucket.iter().enumerate() {
            let cross = offset + slot as f32 * slot_step;
            let position = if horizontal {
                Position::new(options.margin_x + main, options.margin_y + cross)
            } else {
                Position::new(options.margin_x + cross, options.margin_y + main)
            };
            placed.insert(node_id.clone(), position);
        }
    }
    placed
}

/// Longest-path ranks over a topological order; cycles are broken at the
/// remaining node that comes first in input order.
fn compute_ranks(
    node_ids: &[String],
    edges: &[(String, String)],
    node_order: &HashMap<String, usize>,
) -> HashMap<String, usize> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indeg: HashMap<&str, usize> = node_ids.iter().map(|id| (id.as_str(), 0)).collect();
    for (from, to) in edges {
        adj.entry(from.as_str()).or_default().push(to.as_str());
        if let Some(deg) = indeg.get_mut(to.as_str()) {
            *deg += 1;
        }
    }
    let order_key = |id: &str| node_order.get(id).copied().unwrap_or(usize::MAX);

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for id in node_ids {
        if indeg.get(id.as_str()).copied().unwrap_or(0) == 0 {
            ready.push(Reverse((order_key(id.as_str()), id.as_str())));
        }
    }

    let mut order: Vec<&str> = Vec::with_capacity(node_ids.len());
    let mut processed: HashSet<&str> = HashSet::new();
    loop {
        while let Some(Reverse((_key, id))) = ready.pop() {
            if !processed.insert(id) {
                continue;
            }
            order.push(id);
            for &next in adj.get(id).map(Vec::as_slice).unwrap_or(&[]) {
                if processed.contains(next) {
                    continue;
                }
                if let Some(deg) = indeg.get_mut(next) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        ready.push(Reverse((order_key(next), next)));
                    }
                }
            }
        }

        if processed.len() >= node_ids.len() {
            break;
        }

        // Cycle: the earliest unprocessed node becomes a source and its
        // incoming edges act as back-edges.
        let next_source = node_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !processed.contains(id))
            .min_by_key(|id| order_key(*id));
        match next_source {
            Some(id) => ready.push(Reverse((order_key(id), id))),
            None => break,
        }
    }

    let order_index: HashMap<&str, usize> =
        order.iter().enumerate().map(|(idx, id)| (*id, idx)).collect();
    let mut ranks: HashMap<String, usize> = HashMap::new();
    for &node in &order {
        let rank = *ranks.entry(node.to_string()).or_insert(0);
        let from_idx = order_index.get(node).copied().unwrap_or(0);
        for &next in adj.get(node).map(Vec::as_slice).unwrap_or(&[]) {
            let to_idx = order_index.get(next).copied().unwrap_or(from_idx);
            if to_idx <= from_idx {
                continue;
            }
            let entry = ranks.entry(next.to_string()).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }
    ranks
}

/// Alternating down/up sweeps sorting each rank by neighbour medians.
fn order_rank_nodes(
    rank_nodes: &mut [Vec<String>],
    edges: &[(String, String)],
    node_order: &HashMap<String, usize>,
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
    let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();
    for (from, to) in edges {
        outgoing.entry(from.clone()).or_default().push(to.clone());
        incoming.entry(to.clone()).or_default().push(from.clone());
    }

    let mut positions: HashMap<String, usize> = HashMap::new();
    let update_positions = |rank_nodes: &mut [Vec<String>],
                            positions: &mut HashMap<String, usize>| {
        positions.clear();
        for bucket in rank_nodes.iter() {
            for (idx, node_id) in bucket.iter().enumerate() {
                positions.insert(node_id.clone(), idx);
            }
        }
    };
    update_positions(rank_nodes, &mut positions);

    let sort_bucket = |bucket: &mut Vec<String>,
                       neighbors: &HashMap<String, Vec<String>>,
                       positions: &HashMap<String, usize>| {
        let current: HashMap<String, usize> = bucket
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        bucket.sort_by(|a, b| {
            let a_score = median_position(a, neighbors, positions, &current);
            let b_score = median_position(b, neighbors, positions, &current);
            match a_score.partial_cmp(&b_score) {
                Some(Ordering::Equal) | None => {
                    let a_pos = current.get(a).copied().unwrap_or(0);
                    let b_pos = current.get(b).copied().unwrap_or(0);
                    a_pos.cmp(&b_pos).then_with(|| {
                        let a_order = node_order.get(a).copied().unwrap_or(usize::MAX);
                        let b_order = node_order.get(b).copied().unwrap_or(usize::MAX);
                        a_order.cmp(&b_order)
                    })
                }
                Some(ordering) => ordering,
            }
        });
    };

    for _ in 0..passes.max(1) {
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        for rank in (0..rank_nodes.len() - 1).rev() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
            update_positions(rank_nodes, &mut positions);
        }
    }
}

fn median_position(
    node_id: &str,
    neighbors: &HashMap<String, Vec<String>>,
    positions: &HashMap<String, usize>,
    current: &HashMap<String, usize>,
) -> f32 {
    let fallback = current.get(node_id).copied().unwrap_or(0) as f32;
    let Some(list) = neighbors.get(node_id) else {
        return fallback;
    };
    let mut values: Vec<f32> = list
        .iter()
        .filter_map(|neighbor| positions.get(neighbor).map(|pos| *pos as f32))
        .collect();
    if values.is_empty() {
        return fallback;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Handle;

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn empty_nodes_is_a_no_op() {
        let edges = vec![GraphEdge::new("a", "b")];
        let result = rank_layout(&[], &edges, &RankOptions::default());
        assert!(result.nodes.is_empty());
        assert_eq!(result.edges, edges);
    }

    #[test]
    fn chain_descends_top_to_bottom() {
        let nodes = vec![GraphNode::new("A"), GraphNode::new("B"), GraphNode::new("C")];
        let edges = vec![GraphEdge::new("A", "B"), GraphEdge::new("B", "C")];
        let result = rank_layout(&nodes, &edges, &RankOptions::default());
        let y = |id: &str| result.node(id).map(|node| node.position.y).unwrap_or(f32::NAN);
        assert!(y("A") < y("B"));
        assert!(y("B") < y("C"));
        assert_eq!(result.edges[0].source_handle, Some(Handle::Bottom));
        assert_eq!(result.edges[0].target_handle, Some(Handle::Top));
    }

    #[test]
    fn left_right_runs_along_x() {
        let nodes = vec![GraphNode::new("A"), GraphNode::new("B")];
        let edges = vec![GraphEdge::new("A", "B")];
        let options = RankOptions {
            direction: Direction::LeftRight,
            ..RankOptions::default()
        };
        let result = rank_layout(&nodes, &edges, &options);
        let a = result.nodes[0].position;
        let b = result.nodes[1].position;
        assert!(a.x < b.x);
        assert_eq!(result.edges[0].source_handle, Some(Handle::Right));
    }

    #[test]
    fn tolerates_dangling_and_duplicate_edges() {
        let nodes = vec![GraphNode::new("A"), GraphNode::new("B")];
        let edges = vec![
            GraphEdge::new("A", "B"),
            GraphEdge::new("A", "B"),
            GraphEdge::new("A", "missing"),
        ];
        let result = rank_layout(&nodes, &edges, &RankOptions::default());
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.edges.len(), 3);
        assert!(result.edges[2].source_handle.is_none());
        assert_eq!(result.edges[0], result.edges[1]);
    }

    #[test]
    fn does_not_mutate_inputs() {
        let nodes = vec![GraphNode::new("A").at(7.0, 7.0), GraphNode::new("B").at(7.0, 7.0)];
        let edges = vec![GraphEdge::new("A", "B")];
        let before = nodes.clone();
        let _ = rank_layout(&nodes, &edges, &RankOptions::default());
        assert_eq!(nodes, before);
    }

    #[test]
    fn ranks_follow_longest_path_and_break_cycles() {
        let node_ids = ids(&["a", "b", "c", "d"]);
        let order: HashMap<String, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        let ranks = compute_ranks(
            &node_ids,
            &pairs(&[("a", "b"), ("b", "c"), ("a", "c"), ("c", "d"), ("d", "b")]),
            &order,
        );
        assert_eq!(ranks["a"], 0);
        assert_eq!(ranks.len(), 4);
        assert!(ranks["c"] > ranks["b"] || ranks["b"] > ranks["d"]);
    }

    #[test]
    fn manual_fallback_places_every_node_without_overlap() {
        let node_ids = ids(&["r", "x", "y", "z"]);
        let edges = pairs(&[("r", "x"), ("r", "y"), ("r", "z")]);
        for direction in [
            Direction::TopBottom,
            Direction::BottomTop,
            Direction::LeftRight,
            Direction::RightLeft,
        ] {
            let options = RankOptions {
                direction,
                ..RankOptions::default()
            };
            let placed = assign_positions_manual(&node_ids, &edges, &options);
            assert_eq!(placed.len(), 4);
            let root = placed["r"];
            let child = placed["x"];
            match direction {
                Direction::TopBottom => assert!(root.y < child.y),
                Direction::BottomTop => assert!(root.y > child.y),
                Direction::LeftRight => assert!(root.x < child.x),
                Direction::RightLeft => assert!(root.x > child.x),
            }
            let kids = [placed["x"], placed["y"], placed["z"]];
            for i in 0..kids.len() {
                for j in (i + 1)..kids.len() {
                    let apart_x = (kids[i].x - kids[j].x).abs() >= options.node_width;
                    let apart_y = (kids[i].y - kids[j].y).abs() >= options.node_height;
                    assert!(apart_x || apart_y);
                }
            }
        }
    }

    #[test]
    fn median_sweeps_untangle_crossings() {
        let mut rank_nodes = vec![ids(&["a", "b"]), ids(&["y", "x"])];
        let order: HashMap<String, usize> = ["a", "b", "x", "y"]
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.to_string(), idx))
            .collect();
        order_rank_nodes(&mut rank_nodes, &pairs(&[("a", "x"), ("b", "y")]), &order, 2);
        let pos = |rank: usize, id: &str| rank_nodes[rank].iter().position(|n| n == id);
        assert_eq!(
            pos(0, "a") < pos(0, "b"),
            pos(1, "x") < pos(1, "y"),
            "edges a-x and b-y should not cross"
        );
    }
}
