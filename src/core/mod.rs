//! Render-side loop of nnvis: polls the settings store once per frame

mod frame_manager;
mod headless;

pub use frame_manager::{FrameEvent, FrameHandler, FramePoller, FrameStatus};
pub use headless::{HeadlessEngine, PRUNE_THRESHOLD, SAMPLES_PER_EDGE};
