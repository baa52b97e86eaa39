use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::handles::assign_handles;
use super::levels::{HierarchyIndex, label_levels};
use super::overlap::{count_overlaps, resolve_overlaps};
use super::ranking::{RankOptions, rank_layout};
use super::types::{BoxSize, LayoutResult, OverlapReport};
use crate::config::LayoutConfig;
use crate::ir::{Direction, GraphEdge, GraphNode, Position};

/// Level-banded placement: every level gets a row, children gravitate toward
/// the mean x of their parents, rows are decluttered left to right, then the
/// overlap resolver and a top-bottom rank pass finish the job.
pub fn hierarchical_layout(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    config: &LayoutConfig,
) -> LayoutResult {
    if nodes.is_empty() {
        return LayoutResult::new(Vec::new(), edges.to_vec());
    }

    let index = HierarchyIndex::build(nodes, edges);
    let levels = label_levels(nodes, &index);
    let level_of = |node: &GraphNode| levels.get(&node.id).copied().unwrap_or(0);
    let max_level = nodes.iter().map(level_of).max().unwrap_or(0);

    let mut by_level: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        by_level.entry(level_of(node)).or_default().push(idx);
    }

    let distributed = distribute(nodes, &index, &by_level, max_level, config);
    let labeled: Vec<GraphNode> = nodes
        .iter()
        .zip(distributed)
        .map(|(node, position)| GraphNode {
            level: level_of(node),
            position,
            ..node.clone()
        })
        .collect();
    tracing::debug!(
        nodes = labeled.len(),
        levels = by_level.len(),
        max_level,
        "distributed hierarchy levels"
    );

    let node_box = BoxSize::new(config.node_width, config.node_height);
    let (resolved, report) = resolve_overlaps(
        &labeled,
        node_box,
        config.overlap.min_padding,
        config.overlap.max_iterations,
    );

    let mut result = if config.hierarchy.normalize_with_rank {
        let options = RankOptions {
            direction: Direction::TopBottom,
            node_separation: config.hierarchy.normalize_node_separation,
            rank_separation: config.hierarchy.normalize_rank_separation,
            ..RankOptions::from_config(config)
        };
        rank_layout(&resolved, edges, &options)
    } else {
        let edges = assign_handles(edges, &resolved);
        LayoutResult::new(resolved, edges)
    };
    // `iterations` counts the cleanup pass; residuals describe the returned nodes.
    let residual_overlaps = count_overlaps(&result.nodes, node_box, config.overlap.min_padding);
    result.overlap = Some(OverlapReport {
        iterations: report.iterations,
        residual_overlaps,
        converged: residual_overlaps == 0,
    });
    result
}

/// Computes one position per node (same indexing as `nodes`).
fn distribute(
    nodes: &[GraphNode],
    index: &HierarchyIndex,
    by_level: &BTreeMap<usize, Vec<usize>>,
    max_level: usize,
    config: &LayoutConfig,
) -> Vec<Position> {
    let hierarchy = &config.hierarchy;
    let viewport = hierarchy.viewport_or_default();
    let usable_width = (viewport.width - 2.0 * hierarchy.side_margin).max(config.node_width);
    let usable_height = (viewport.height - 2.0 * hierarchy.top_margin).max(config.node_height);
    let vertical_spacing = (usable_height / (max_level + 1) as f32)
        .max(config.node_height + config.overlap.min_padding);
    let slot = config.node_width + hierarchy.sibling_gap;

    let mut positions = vec![Position::default(); nodes.len()];
    let mut placed_x: HashMap<&str, f32> = HashMap::new();

    // Ascending levels: parents are always placed before their children.
    for (&level, members) in by_level {
        let y = level as f32 * vertical_spacing + hierarchy.top_margin;
        let row_width = members.len() as f32 * slot - hierarchy.sibling_gap;
        let row_start = (hierarchy.side_margin + (usable_width - row_width) / 2.0)
            .max(hierarchy.side_margin);

        for (slot_idx, &idx) in members.iter().enumerate() {
            let node = &nodes[idx];
            let parent_xs: Vec<f32> = index
                .parents_of(&node.id)
                .iter()
                .filter_map(|parent| placed_x.get(parent.as_str()).copied())
                .collect();
            let x = if parent_xs.is_empty() {
                row_start + slot_idx as f32 * slot
            } else {
                parent_xs.iter().sum::<f32>() / parent_xs.len() as f32
            };
            positions[idx] = Position::new(x, y);
            placed_x.insert(node.id.as_str(), x);
        }

        declutter_row(members, &mut positions, slot);
        for &idx in members {
            placed_x.insert(nodes[idx].id.as_str(), positions[idx].x);
        }
    }
    positions
}

/// Walks a row left to right pushing each node at least `min_step` past its
/// predecessor. Nodes only ever move right.
fn declutter_row(members: &[usize], positions: &mut [Position], min_step: f32) {
    let mut ordered: Vec<usize> = members.to_vec();
    ordered.sort_by(|a, b| {
        positions[*a]
            .x
            .partial_cmp(&positions[*b].x)
            .unwrap_or(Ordering::Equal)
    });
    let mut previous: Option<f32> = None;
    for idx in ordered {
        if let Some(prev_x) = previous {
            let min_x = prev_x + min_step;
            if positions[idx].x < min_x {
                positions[idx].x = min_x;
            }
        }
        previous = Some(positions[idx].x);
    }
}
