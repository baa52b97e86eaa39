#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{HierarchyConfig, LayoutConfig, OverlapConfig, RankConfig, Viewport, load_config};
pub use error::LayoutError;
pub use ir::{Direction, GraphDocument, GraphEdge, GraphNode, Handle, Position};
pub use layout::{
    BoxSize, LayoutMode, LayoutResult, OverlapReport, RankOptions, assign_handles, compute_layout,
    hierarchical_layout, label_distances, rank_layout, resolve_overlaps,
};

/// JSON in, JSON out: parses a graph document, lays it out and serializes the result.
pub fn layout_json(
    input: &str,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> Result<String, LayoutError> {
    let document = GraphDocument::from_json(input)?;
    let result = compute_layout(&document, mode, config);
    serde_json::to_string(&result).map_err(LayoutError::Serialize)
}
