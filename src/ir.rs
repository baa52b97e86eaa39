use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::LayoutError;

/// Edge type marking ownership edges that define the hierarchy.
pub const PARENT_CHILD: &str = "parent_child";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TB", alias = "TD")]
    TopBottom,
    #[serde(rename = "BT")]
    BottomTop,
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "TB" | "TD" => Some(Self::TopBottom),
            "BT" => Some(Self::BottomTop),
            "LR" => Some(Self::LeftRight),
            "RL" => Some(Self::RightLeft),
            _ => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }
}

impl std::str::FromStr for Direction {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| LayoutError::UnknownDirection(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Side of a node box an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Top,
    Bottom,
    Left,
    Right,
}

impl Handle {
    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "nullable_level")]
    pub level: usize,
    #[serde(default)]
    pub position: Position,
    /// Presentation fields (name, description, color, type, ...) carried through untouched.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            level: 0,
            position: Position::default(),
            data: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }
}

fn nullable_level<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<usize>::deserialize(deserializer)?.unwrap_or(0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "sourceId")]
    pub source: String,
    #[serde(alias = "targetId")]
    pub target: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Handle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Handle>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            edge_type: None,
            label: None,
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn parent_child(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target).with_type(PARENT_CHILD)
    }

    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Untyped edges count as hierarchy edges; typed ones only when `parent_child`.
    pub fn is_hierarchy(&self) -> bool {
        match self.edge_type.as_deref() {
            None => true,
            Some(kind) => kind == PARENT_CHILD,
        }
    }
}

/// Node and edge snapshot handed to the engine for a single layout call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Parses strict JSON, retrying as JSON5 so hand-written fixtures may carry
    /// comments and trailing commas. The strict parser's error is reported.
    pub fn from_json(input: &str) -> Result<Self, LayoutError> {
        match serde_json::from_str::<Self>(input) {
            Ok(document) => Ok(document),
            Err(err) => json5::from_str::<Self>(input).map_err(|_| LayoutError::InvalidDocument(err)),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LayoutError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fetch_api_shape() {
        let input = r##"{
            "nodes": [
                {"id": "a", "name": "Ada", "type": "persona", "level": null},
                {"id": "b", "parentId": "a", "name": "Compilers", "color": "#ff0000"}
            ],
            "edges": [
                {"id": "e1", "sourceId": "a", "targetId": "b", "type": "parent_child"},
                {"source": "b", "target": "a", "label": "inspires", "type": "related"}
            ]
        }"##;
        let doc = GraphDocument::from_json(input).expect("document should parse");
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].level, 0);
        assert_eq!(doc.nodes[1].parent_id.as_deref(), Some("a"));
        assert_eq!(doc.nodes[1].data.get("color"), Some(&Value::from("#ff0000")));
        assert!(doc.edges[0].is_hierarchy());
        assert!(!doc.edges[1].is_hierarchy());
        assert_eq!(doc.edges[1].label.as_deref(), Some("inspires"));
    }

    #[test]
    fn accepts_json5_documents() {
        let input = "{ nodes: [{ id: 'a' }, { id: 'b' },], // trailing comma\n edges: [] }";
        let doc = GraphDocument::from_json(input).expect("json5 fallback");
        assert_eq!(doc.nodes.len(), 2);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            GraphDocument::from_json("nodes: ["),
            Err(LayoutError::InvalidDocument(_))
        ));
    }

    #[test]
    fn serializes_handles_in_camel_case() {
        let mut edge = GraphEdge::new("a", "b");
        edge.source_handle = Some(Handle::Bottom);
        edge.target_handle = Some(Handle::Top);
        let json = serde_json::to_value(&edge).expect("serialize edge");
        assert_eq!(json["sourceHandle"], "bottom");
        assert_eq!(json["targetHandle"], "top");
        assert!(json.get("type").is_none());
    }

    #[test]
    fn direction_tokens() {
        assert_eq!(Direction::from_token("td"), Some(Direction::TopBottom));
        assert_eq!(Direction::from_token("RL"), Some(Direction::RightLeft));
        assert!("sideways".parse::<Direction>().is_err());
        assert!(Direction::LeftRight.is_horizontal());
    }
}
