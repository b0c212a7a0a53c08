//! Frame poller: the render/processing side of the settings store
//!
//! Once per frame the poller consumes the one-shot flags raised by the
//! options panel, hands the resulting events to the rendering engine, and
//! publishes the engine's statistics back for the readout.

use log::{info, trace, warn};
use nnvis_core::keys;
use nnvis_core::{
    ActionState, LayerTopology, ModelSource, SettingsSnapshot, SettingsStore, Statistics,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Work the engine has to do, derived from one-shot flags and state changes
#[derive(Debug, Clone)]
pub enum FrameEvent {
    /// `update_model` was raised: rebuild from the published layers and data
    RebuildModel {
        layers: LayerTopology,
        source: ModelSource,
    },
    /// `save_file` was raised with `save_processed_nn_path`
    SaveProcessed { path: PathBuf },
    /// `trigger_network_sample` was raised
    Resample,
    ActionChanged { from: ActionState, to: ActionState },
}

/// The rendering/processing engine driven by the poller
pub trait FrameHandler: Send {
    fn handle_event(&mut self, event: FrameEvent);

    /// Advance one frame and report the statistics readout (`fps` is filled in by the poller)
    fn render_frame(&mut self, snapshot: &SettingsSnapshot, action: ActionState) -> Statistics;
}

/// Whether the loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Closed,
}

pub struct FramePoller {
    store: Arc<SettingsStore>,
    handler: Box<dyn FrameHandler>,
    last_action: ActionState,
    last_frame: Option<Instant>,
    fps: f64,
    frames: u64,
}

impl FramePoller {
    pub fn new(store: Arc<SettingsStore>, handler: Box<dyn FrameHandler>) -> Self {
        let last_action = store.action();
        Self {
            store,
            handler,
            last_action,
            last_frame: None,
            fps: 0.0,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Poll the store once
    pub fn poll_frame(&mut self, now: Instant) -> FrameStatus {
        if self.store.is_closed() {
            return FrameStatus::Closed;
        }

        if let Some((true, published)) = self.store.consume_with_snapshot(keys::UPDATE_MODEL) {
            let source = if let Some(data) = published.get(keys::IMPORTANCE_DATA) {
                ModelSource::Importance(data)
            } else if let Some(network) = published.get(keys::PROCESSED_NN) {
                ModelSource::Processed(network)
            } else {
                ModelSource::Topology
            };
            self.handler.handle_event(FrameEvent::RebuildModel {
                layers: published.layers(),
                source,
            });
        }

        // The path is read from the state published with the flag, never from a later write
        if let Some((true, published)) = self.store.consume_with_snapshot(keys::SAVE_FILE) {
            match published.get(keys::SAVE_PROCESSED_NN_PATH) {
                Some(path) => self.handler.handle_event(FrameEvent::SaveProcessed {
                    path: PathBuf::from(path),
                }),
                None => warn!("Save requested without a target path"),
            }
        }

        if self.store.consume_once(keys::TRIGGER_NETWORK_SAMPLE).is_some() {
            self.handler.handle_event(FrameEvent::Resample);
        }

        let snapshot = self.store.snapshot();
        let action = snapshot.action();
        if action != self.last_action {
            self.handler.handle_event(FrameEvent::ActionChanged {
                from: self.last_action,
                to: action,
            });
            self.last_action = action;
        }

        let mut stats = self.handler.render_frame(&snapshot, action);
        stats.fps = self.update_fps(now);
        self.store.publish_statistics(&stats);
        self.frames += 1;
        FrameStatus::Continue
    }

    /// Exponentially smoothed frame rate
    fn update_fps(&mut self, now: Instant) -> f64 {
        if let Some(last) = self.last_frame {
            let dt = now.duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let instant_fps = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    instant_fps
                } else {
                    self.fps * 0.9 + instant_fps * 0.1
                };
            }
        }
        self.last_frame = Some(now);
        self.fps
    }

    /// Poll at a fixed cadence until the session is closed
    ///
    /// Returns the number of frames rendered.
    pub async fn run(mut self, interval: Duration) -> u64 {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!("Starting frame loop ({:?} per frame)", interval);
        loop {
            ticker.tick().await;

            let start = Instant::now();
            if self.poll_frame(start) == FrameStatus::Closed {
                break;
            }
            trace!("Frame took {:?}", start.elapsed());
        }
        info!("Frame loop stopped after {} frames", self.frames);
        self.frames
    }
}
