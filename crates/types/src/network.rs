//! Network topology and the loaded data objects handed to the render loop

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Ordered neuron counts per layer, index = layer depth
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerTopology(Vec<u32>);

impl LayerTopology {
    pub fn new(layers: Vec<u32>) -> Self {
        Self(layers)
    }

    pub fn layers(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Size of the final layer, i.e. the number of output classes
    pub fn output_size(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// Store representation (`current_layer_data`)
    pub fn to_setting(&self) -> Vec<i64> {
        self.0.iter().map(|&n| i64::from(n)).collect()
    }

    /// Rebuild from the store representation, dropping negative counts
    pub fn from_setting(values: &[i64]) -> Self {
        Self(
            values
                .iter()
                .filter_map(|&n| match u32::try_from(n) {
                    Ok(count) => Some(count),
                    Err(_) => {
                        log::warn!("Ignoring invalid neuron count {} in layer data", n);
                        None
                    }
                })
                .collect(),
        )
    }
}

impl From<Vec<u32>> for LayerTopology {
    fn from(layers: Vec<u32>) -> Self {
        Self(layers)
    }
}

/// Raw network with per-edge importance values, as produced by the importance loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportanceData {
    pub layer_data: LayerTopology,
    /// One importance matrix per layer transition, flattened row-major
    #[serde(default)]
    pub importance: Vec<Vec<f32>>,
}

/// Previously processed network (node/edge positions and derived state)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessedNetwork {
    pub layer_data: LayerTopology,
    /// Opaque processed artifacts, owned by the processing engine
    #[serde(default)]
    pub artifacts: serde_json::Map<String, serde_json::Value>,
}

/// Where a model generation request gets its data from
///
/// At most one object reference is attached to a generation cycle.
#[derive(Debug, Clone, Default)]
pub enum ModelSource {
    /// Generate a fresh network from the layer topology only
    #[default]
    Topology,
    Importance(Arc<ImportanceData>),
    Processed(Arc<ProcessedNetwork>),
}
