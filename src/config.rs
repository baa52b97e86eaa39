use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LayoutError;
use crate::ir::Direction;

const DEFAULT_VIEWPORT_WIDTH: f32 = 1200.0;
const DEFAULT_VIEWPORT_HEIGHT: f32 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub rank: RankConfig,
    pub overlap: OverlapConfig,
    pub hierarchy: HierarchyConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 150.0,
            node_height: 50.0,
            rank: RankConfig::default(),
            overlap: OverlapConfig::default(),
            hierarchy: HierarchyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConfig {
    pub direction: Direction,
    pub node_separation: f32,
    pub rank_separation: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    /// Median sweeps used by the built-in ranker when dagre yields nothing.
    pub order_passes: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            direction: Direction::TopBottom,
            node_separation: 50.0,
            rank_separation: 50.0,
            margin_x: 20.0,
            margin_y: 20.0,
            order_passes: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapConfig {
    pub min_padding: f32,
    pub max_iterations: usize,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            min_padding: 20.0,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Host viewport; `None` outside a browser, which falls back to 1200x800.
    pub viewport: Option<Viewport>,
    pub top_margin: f32,
    pub side_margin: f32,
    pub sibling_gap: f32,
    pub normalize_with_rank: bool,
    pub normalize_node_separation: f32,
    pub normalize_rank_separation: f32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            viewport: None,
            top_margin: 50.0,
            side_margin: 50.0,
            sibling_gap: 30.0,
            normalize_with_rank: true,
            normalize_node_separation: 100.0,
            normalize_rank_separation: 150.0,
        }
    }
}

impl HierarchyConfig {
    pub fn viewport_or_default(&self) -> Viewport {
        self.viewport.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RankConfigFile {
    direction: Option<String>,
    node_separation: Option<f32>,
    rank_separation: Option<f32>,
    margin_x: Option<f32>,
    margin_y: Option<f32>,
    order_passes: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct OverlapConfigFile {
    min_padding: Option<f32>,
    max_iterations: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct HierarchyConfigFile {
    viewport_width: Option<f32>,
    viewport_height: Option<f32>,
    top_margin: Option<f32>,
    side_margin: Option<f32>,
    sibling_gap: Option<f32>,
    normalize_with_rank: Option<bool>,
    normalize_node_separation: Option<f32>,
    normalize_rank_separation: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    rank: Option<RankConfigFile>,
    overlap: Option<OverlapConfigFile>,
    hierarchy: Option<HierarchyConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Overlays a camelCase JSON (or JSON5) config document on the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<LayoutConfig> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(err) => json5::from_str(contents).map_err(|_| err)?,
    };
    let mut config = LayoutConfig::default();

    if let Some(v) = parsed.node_width {
        config.node_width = v;
    }
    if let Some(v) = parsed.node_height {
        config.node_height = v;
    }

    if let Some(rank) = parsed.rank {
        if let Some(token) = rank.direction {
            config.rank.direction = Direction::from_token(&token)
                .ok_or(LayoutError::UnknownDirection(token))?;
        }
        if let Some(v) = rank.node_separation {
            config.rank.node_separation = v;
        }
        if let Some(v) = rank.rank_separation {
            config.rank.rank_separation = v;
        }
        if let Some(v) = rank.margin_x {
            config.rank.margin_x = v;
        }
        if let Some(v) = rank.margin_y {
            config.rank.margin_y = v;
        }
        if let Some(v) = rank.order_passes {
            config.rank.order_passes = v;
        }
    }

    if let Some(overlap) = parsed.overlap {
        if let Some(v) = overlap.min_padding {
            config.overlap.min_padding = v;
        }
        if let Some(v) = overlap.max_iterations {
            config.overlap.max_iterations = v;
        }
    }

    if let Some(hierarchy) = parsed.hierarchy {
        if hierarchy.viewport_width.is_some() || hierarchy.viewport_height.is_some() {
            let base = Viewport::default();
            config.hierarchy.viewport = Some(Viewport {
                width: hierarchy.viewport_width.unwrap_or(base.width),
                height: hierarchy.viewport_height.unwrap_or(base.height),
            });
        }
        if let Some(v) = hierarchy.top_margin {
            config.hierarchy.top_margin = v;
        }
        if let Some(v) = hierarchy.side_margin {
            config.hierarchy.side_margin = v;
        }
        if let Some(v) = hierarchy.sibling_gap {
            config.hierarchy.sibling_gap = v;
        }
        if let Some(v) = hierarchy.normalize_with_rank {
            config.hierarchy.normalize_with_rank = v;
        }
        if let Some(v) = hierarchy.normalize_node_separation {
            config.hierarchy.normalize_node_separation = v;
        }
        if let Some(v) = hierarchy.normalize_rank_separation {
            config.hierarchy.normalize_rank_separation = v;
        }
    }

    Ok(config)
}
