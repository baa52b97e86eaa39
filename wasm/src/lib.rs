use kgraph_layout::{Direction, LayoutConfig, LayoutMode, Viewport, layout_json};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOptions {
    mode: Option<String>,
    direction: Option<String>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    viewport_width: Option<f32>,
    viewport_height: Option<f32>,
    max_iterations: Option<usize>,
}

fn build_layout_config(options: &LayoutOptions) -> Result<(LayoutMode, LayoutConfig), String> {
    let mode = match options.mode.as_deref() {
        Some(token) => {
            LayoutMode::from_token(token).ok_or_else(|| format!("unknown layout mode `{token}`"))?
        }
        None => LayoutMode::Hierarchical,
    };

    let mut config = LayoutConfig::default();
    if let Some(token) = options.direction.as_deref() {
        config.rank.direction = token.parse::<Direction>().map_err(|err| err.to_string())?;
    }
    if let Some(width) = options.node_width {
        config.node_width = width;
    }
    if let Some(height) = options.node_height {
        config.node_height = height;
    }
    if options.viewport_width.is_some() || options.viewport_height.is_some() {
        let base = Viewport::default();
        config.hierarchy.viewport = Some(Viewport {
            width: options.viewport_width.unwrap_or(base.width),
            height: options.viewport_height.unwrap_or(base.height),
        });
    }
    if let Some(max_iterations) = options.max_iterations {
        config.overlap.max_iterations = max_iterations;
    }
    Ok((mode, config))
}

/// Lays out a `{nodes, edges}` JSON document; the host passes its window size
/// as `viewportWidth` / `viewportHeight`.
#[wasm_bindgen]
pub fn layout_graph_json(document: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<LayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        LayoutOptions::default()
    };

    let (mode, config) = build_layout_config(&options).map_err(|error| JsValue::from_str(&error))?;
    layout_json(document, mode, &config).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use kgraph_layout::{LayoutMode, layout_json};

    use crate::{LayoutOptions, build_layout_config};

    #[test]
    fn lays_out_persona_hierarchy() {
        let document = r#"{
            "nodes": [
                {"id": "p", "name": "Grace Hopper", "type": "persona"},
                {"id": "i", "parentId": "p", "name": "Compilers", "type": "industry"}
            ],
            "edges": [{"id": "e", "sourceId": "p", "targetId": "i", "type": "parent_child"}]
        }"#;

        let (mode, config) =
            build_layout_config(&LayoutOptions::default()).expect("default options are valid");
        assert_eq!(mode, LayoutMode::Hierarchical);
        let json = layout_json(document, mode, &config).expect("hierarchy should lay out");

        assert!(json.contains("\"sourceHandle\":\"bottom\""));
        assert!(json.contains("Grace Hopper"));
    }

    #[test]
    fn rejects_unknown_mode() {
        let options = LayoutOptions {
            mode: Some("radial".to_string()),
            ..LayoutOptions::default()
        };
        assert!(build_layout_config(&options).is_err());
    }
}
