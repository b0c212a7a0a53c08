//! Configuration management

pub mod defaults;
mod settings;
mod window;

pub use settings::{
    config_dir, ConfigSet, PersistedConfig, ProcessingConfig, RenderingConfig, WindowConfig,
    CONFIG_VERSION,
};
pub use window::WindowPositionSaver;
