//! Default values for the persisted configs
//!
//! Every key the options panel can edit has an entry here, so a fresh
//! install renders something sensible before anything is stored.

use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Render modes: 0 = off, 1 = points, 2 = lines/volume (interpreted by the renderer)
pub const GRID_RENDER_MODE: &str = "grid_render_mode";
pub const EDGE_RENDER_MODE: &str = "edge_render_mode";
pub const NODE_RENDER_MODE: &str = "node_render_mode";

/// Shader settings shared by edges and nodes, prefixed with `edge_` / `node_`
pub const SHADER_SETTINGS: [&str; 6] = [
    "object_radius",
    "base_opacity",
    "importance_opacity",
    "depth_opacity",
    "opacity_exponent",
    "importance_threshold",
];

fn to_map(value: Value) -> BTreeMap<String, Value> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    }
}

pub fn rendering() -> BTreeMap<String, Value> {
    to_map(json!({
        GRID_RENDER_MODE: 0,
        EDGE_RENDER_MODE: 0,
        NODE_RENDER_MODE: 0,
        "edge_object_radius": 0.05,
        "edge_base_opacity": 0.0,
        "edge_importance_opacity": 1.0,
        "edge_depth_opacity": 0.0,
        "edge_opacity_exponent": 1.0,
        "edge_importance_threshold": 0.01,
        "node_object_radius": 0.05,
        "node_base_opacity": 0.0,
        "node_importance_opacity": 1.0,
        "node_depth_opacity": 0.0,
        "node_opacity_exponent": 1.0,
        "node_importance_threshold": 0.01,
    }))
}

pub fn processing() -> BTreeMap<String, Value> {
    to_map(json!({
        "smoothing": 1,
        "sampling_rate": 15.0,
        "prune_percentage": 0.0,
        "edge_bandwidth_reduction": 0.9,
        "edge_importance_type": 0,
        "node_bandwidth_reduction": 0.95,
        "layer_distance": 1.0,
        "layer_width": 1.0,
    }))
}

pub fn window() -> BTreeMap<String, Value> {
    to_map(json!({
        "screen_x": 0,
        "screen_y": 0,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shader_setting_has_edge_and_node_defaults() {
        let defaults = rendering();
        for setting in SHADER_SETTINGS {
            assert!(defaults.contains_key(&format!("edge_{}", setting)));
            assert!(defaults.contains_key(&format!("node_{}", setting)));
        }
    }
}
