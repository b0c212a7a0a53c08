//! Headless engine used by the console binary
//!
//! Keeps just enough model state to answer the statistics readout and to
//! write a processed network file, without any GPU work.

use super::frame_manager::{FrameEvent, FrameHandler};
use anyhow::{Context, Result};
use log::{error, info};
use nnvis_core::{ActionState, LayerTopology, ModelSource, SettingsSnapshot, Statistics};
use nnvis_types::ProcessedNetwork;
use serde_json::json;
use std::path::Path;

/// Sample points placed along every edge by a resample
pub const SAMPLES_PER_EDGE: i64 = 16;

/// Edges whose importance falls below this are pruned
pub const PRUNE_THRESHOLD: f32 = 0.01;

#[derive(Debug, Default)]
pub struct HeadlessEngine {
    layers: LayerTopology,
    edge_count: i64,
    sample_count: i64,
    pruned_edges: i64,
    /// Frames spent running a non-stop action since the last rebuild
    action_steps: u64,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &LayerTopology {
        &self.layers
    }

    pub fn action_steps(&self) -> u64 {
        self.action_steps
    }

    fn rebuild(&mut self, layers: LayerTopology, source: &ModelSource) {
        self.edge_count = layers
            .layers()
            .windows(2)
            .map(|pair| i64::from(pair[0]).saturating_mul(i64::from(pair[1])))
            .fold(0, i64::saturating_add);
        self.pruned_edges = match source {
            ModelSource::Importance(data) => data
                .importance
                .iter()
                .flatten()
                .filter(|&&value| value < PRUNE_THRESHOLD)
                .count() as i64,
            ModelSource::Processed(network) => network
                .artifacts
                .get("pruned_edges")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0),
            ModelSource::Topology => 0,
        };
        self.sample_count = self.sampled_edges().saturating_mul(SAMPLES_PER_EDGE);
        self.action_steps = 0;
        self.layers = layers;
        info!(
            "Rebuilt model {:?}: {} edges, {} pruned",
            self.layers.layers(),
            self.edge_count,
            self.pruned_edges
        );
    }

    fn save(&self, path: &Path) -> Result<()> {
        let mut artifacts = serde_json::Map::new();
        artifacts.insert("edge_count".to_string(), json!(self.edge_count));
        artifacts.insert("sample_count".to_string(), json!(self.sample_count));
        artifacts.insert("pruned_edges".to_string(), json!(self.pruned_edges));
        artifacts.insert("action_steps".to_string(), json!(self.action_steps));
        let network = ProcessedNetwork {
            layer_data: self.layers.clone(),
            artifacts,
        };
        let content = serde_json::to_string_pretty(&network)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write processed network {:?}", path))?;
        info!("Saved processed network to {:?}", path);
        Ok(())
    }

    fn sampled_edges(&self) -> i64 {
        self.edge_count.saturating_sub(self.pruned_edges).max(0)
    }

    /// Grid cells of the volume the network is drawn in, saturating for huge layers
    fn cell_count(&self) -> i64 {
        let widest = i64::from(self.layers.layers().iter().copied().max().unwrap_or(0));
        let depth = i64::try_from(self.layers.len()).unwrap_or(i64::MAX);
        widest.saturating_mul(widest).saturating_mul(depth)
    }
}

impl FrameHandler for HeadlessEngine {
    fn handle_event(&mut self, event: FrameEvent) {
        match event {
            FrameEvent::RebuildModel { layers, source } => self.rebuild(layers, &source),
            FrameEvent::SaveProcessed { path } => {
                if let Err(e) = self.save(&path) {
                    error!("{:#}", e);
                }
            }
            FrameEvent::Resample => {
                self.sample_count = self.sampled_edges().saturating_mul(SAMPLES_PER_EDGE);
                info!("Resampled {} edges", self.sampled_edges());
            }
            FrameEvent::ActionChanged { from, to } => info!("Action {} -> {}", from, to),
        }
    }

    fn render_frame(&mut self, _snapshot: &SettingsSnapshot, action: ActionState) -> Statistics {
        if action != ActionState::Stop {
            self.action_steps += 1;
        }
        Statistics {
            edge_count: self.edge_count,
            sample_count: self.sample_count,
            cell_count: self.cell_count(),
            pruned_edges: self.pruned_edges,
            fps: 0.0,
        }
    }
}
