//! nnvis-core: The shared settings store for the nnvis visualizer.
//!
//! This crate contains the thread-safe [`SettingsStore`] written by the
//! options UI and polled by the render loop, its error type, the global
//! store instance, and shared constants.

pub mod constants;
mod error;
mod store;

pub use constants::{
    DEFAULT_LAYERS, DEFAULT_LAYER_NEURONS, FRAME_INTERVAL, WINDOW_SAVE_DEBOUNCE,
};
pub use error::SettingsError;
pub use store::{global_store, init_global_store, SettingsSnapshot, SettingsStore};

// Re-export types used in the store's signatures for convenience
pub use nnvis_types::keys;
pub use nnvis_types::{
    ActionEvent, ActionState, Key, LayerTopology, ModelSource, SettingType, SettingValue,
    Statistics, ValueKind,
};
