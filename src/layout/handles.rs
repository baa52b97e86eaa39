use std::collections::HashMap;

use crate::ir::{GraphEdge, GraphNode, Handle, Position};

/// Picks the box side each edge attaches to from final node positions.
///
/// Boxes are uniform, so the top-left displacement equals the centre
/// displacement. Edges with a missing endpoint are returned unchanged.
pub fn assign_handles(edges: &[GraphEdge], nodes: &[GraphNode]) -> Vec<GraphEdge> {
    let positions: HashMap<&str, Position> = nodes
        .iter()
        .map(|node| (node.id.as_str(), node.position))
        .collect();

    edges
        .iter()
        .map(|edge| {
            let (Some(from), Some(to)) = (
                positions.get(edge.source.as_str()),
                positions.get(edge.target.as_str()),
            ) else {
                tracing::warn!(
                    source = %edge.source,
                    target = %edge.target,
                    "edge references a missing node; handles left unset"
                );
                return edge.clone();
            };
            let (source_handle, target_handle) = edge_handles(*from, *to);
            GraphEdge {
                source_handle: Some(source_handle),
                target_handle: Some(target_handle),
                ..edge.clone()
            }
        })
        .collect()
}

/// Horizontal when the x gap dominates, vertical otherwise (ties included).
pub fn edge_handles(from: Position, to: Position) -> (Handle, Handle) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() > dy.abs() {
        if dx >= 0.0 {
            (Handle::Right, Handle::Left)
        } else {
            (Handle::Left, Handle::Right)
        }
    } else if dy >= 0.0 {
        (Handle::Bottom, Handle::Top)
    } else {
        (Handle::Top, Handle::Bottom)
    }
}
