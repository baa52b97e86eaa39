use crate::config::LayoutConfig;
use crate::ir::{GraphEdge, GraphNode, Handle};
use crate::layout::{BoxSize, LayoutMode, LayoutResult, count_overlaps};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub mode: LayoutMode,
    pub node_count: usize,
    pub edge_count: usize,
    pub max_level: usize,
    pub bounds: Bounds,
    pub residual_overlaps: usize,
    pub iterations: Option<usize>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub level: usize,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: Option<String>,
    pub source_handle: Option<Handle>,
    pub target_handle: Option<Handle>,
}

impl LayoutDump {
    pub fn from_result(result: &LayoutResult, mode: LayoutMode, config: &LayoutConfig) -> Self {
        let node_box = BoxSize::new(config.node_width, config.node_height);
        let nodes = result
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                level: node.level,
                x: node.position.x,
                y: node.position.y,
            })
            .collect();
        let edges = result
            .edges
            .iter()
            .map(|edge: &GraphEdge| EdgeDump {
                source: edge.source.clone(),
                target: edge.target.clone(),
                edge_type: edge.edge_type.clone(),
                source_handle: edge.source_handle,
                target_handle: edge.target_handle,
            })
            .collect();

        LayoutDump {
            mode,
            node_count: result.nodes.len(),
            edge_count: result.edges.len(),
            max_level: result.max_level(),
            bounds: bounds(&result.nodes, node_box),
            residual_overlaps: count_overlaps(&result.nodes, node_box, config.overlap.min_padding),
            iterations: result.overlap.map(|report| report.iterations),
            nodes,
            edges,
        }
    }
}

/// Bounding rectangle of all node boxes; all zeros for an empty layout.
pub fn bounds(nodes: &[GraphNode], node_box: BoxSize) -> Bounds {
    let mut iter = nodes.iter().map(|node| node.position);
    let Some(first) = iter.next() else {
        return Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        };
    };
    let mut out = Bounds {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x + node_box.width,
        max_y: first.y + node_box.height,
    };
    for pos in iter {
        out.min_x = out.min_x.min(pos.x);
        out.min_y = out.min_y.min(pos.y);
        out.max_x = out.max_x.max(pos.x + node_box.width);
        out.max_y = out.max_y.max(pos.y + node_box.height);
    }
    out
}

/// Writes pretty JSON to `path`, or stdout when no path is given.
pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

pub fn write_layout_dump(
    path: Option<&Path>,
    result: &LayoutResult,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> anyhow::Result<()> {
    let dump = LayoutDump::from_result(result, mode, config);
    write_json(path, &dump)
}
