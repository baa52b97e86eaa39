mod handles;
mod hierarchy;
mod levels;
pub(crate) mod overlap;
mod ranking;
pub(crate) mod types;

pub use handles::{assign_handles, edge_handles};
pub use hierarchy::hierarchical_layout;
pub use levels::{HierarchyIndex, apply_levels, label_distances, label_levels};
pub use overlap::{count_overlaps, resolve_overlaps};
pub use ranking::{RankOptions, rank_layout};
pub use types::*;

use crate::config::LayoutConfig;
use crate::ir::GraphDocument;

/// Lays out one graph snapshot. Stateless: every call starts from the
/// document's own positions and returns fresh collections.
pub fn compute_layout(
    document: &GraphDocument,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> LayoutResult {
    if document.is_empty() {
        return LayoutResult::new(Vec::new(), document.edges.clone());
    }
    match mode {
        LayoutMode::Rank => compute_rank_layout(document, config),
        LayoutMode::Hierarchical => hierarchical_layout(&document.nodes, &document.edges, config),
    }
}

fn compute_rank_layout(document: &GraphDocument, config: &LayoutConfig) -> LayoutResult {
    let (labeled, _) = apply_levels(&document.nodes, &document.edges);
    let options = RankOptions::from_config(config);
    let ranked = rank_layout(&labeled, &document.edges, &options);
    let (nodes, report) = resolve_overlaps(
        &ranked.nodes,
        options.node_box(),
        config.overlap.min_padding,
        config.overlap.max_iterations,
    );
    // Handles depend on final positions, so they are recomputed after cleanup.
    let edges = assign_handles(&document.edges, &nodes);
    LayoutResult {
        nodes,
        edges,
        overlap: Some(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{GraphEdge, GraphNode, Handle};

    fn persona_graph() -> GraphDocument {
        GraphDocument::new(
            vec![
                GraphNode::new("persona"),
                GraphNode::new("industry").with_parent("persona"),
                GraphNode::new("keyword-a").with_parent("industry"),
                GraphNode::new("keyword-b").with_parent("industry"),
                GraphNode::new("summary"),
            ],
            vec![
                GraphEdge::parent_child("persona", "industry"),
                GraphEdge::new("summary", "persona").with_type("describes"),
            ],
        )
    }

    #[test]
    fn empty_document_yields_empty_result() {
        for mode in [LayoutMode::Rank, LayoutMode::Hierarchical] {
            let result = compute_layout(&GraphDocument::default(), mode, &LayoutConfig::default());
            assert!(result.nodes.is_empty());
            assert!(result.edges.is_empty());
        }
    }

    #[test]
    fn both_modes_label_levels_and_assign_handles() {
        let document = persona_graph();
        for mode in [LayoutMode::Rank, LayoutMode::Hierarchical] {
            let result = compute_layout(&document, mode, &LayoutConfig::default());
            assert_eq!(result.nodes.len(), 5);
            let level = |id: &str| result.node(id).map(|node| node.level);
            assert_eq!(level("persona"), Some(0));
            assert_eq!(level("industry"), Some(1));
            assert_eq!(level("keyword-b"), Some(2));
            assert_eq!(level("summary"), Some(0));
            assert!(result.edges.iter().all(|edge| edge.source_handle.is_some()));
            assert_eq!(result.edges[0].source_handle, Some(Handle::Bottom));
            assert!(result.overlap.is_some());
        }
    }

    #[test]
    fn rank_mode_is_reproducible() {
        let document = persona_graph();
        let config = LayoutConfig::default();
        let first = compute_layout(&document, LayoutMode::Rank, &config);
        let second = compute_layout(&document, LayoutMode::Rank, &config);
        assert_eq!(first, second);
    }
}
