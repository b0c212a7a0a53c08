//! nnvis: options panel and render loop of a neural-network visualizer
//!
//! This library provides:
//! - The options panel handlers that publish settings for the render loop
//! - The frame poller that consumes them once per frame
//! - Persisted rendering, processing and window configuration
//! - Network file loading

pub mod config;
pub mod core;
pub mod data;
pub mod ui;

// Re-export commonly used types
pub use config::{ConfigSet, ProcessingConfig, RenderingConfig, WindowConfig};
pub use self::core::{FrameHandler, FramePoller, HeadlessEngine};
pub use nnvis_core::{global_store, init_global_store, SettingsStore};
pub use ui::{OptionsPanel, PanelServices};
