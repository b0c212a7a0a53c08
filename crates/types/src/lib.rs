//! nnvis-types: Shared data types for the nnvis settings store.
//!
//! This crate contains pure data types (setting values, the typed key
//! registry, the action selector, network topology) that are shared by the
//! store and the options controller. It has no threading or I/O.

pub mod action;
pub mod classes;
pub mod keys;
pub mod network;
pub mod stats;
pub mod value;

// Re-export commonly used types at the crate root for convenience
pub use action::{ActionEvent, ActionState};
pub use classes::{class_options, DEFAULT_CLASS_COUNT};
pub use keys::Key;
pub use network::{ImportanceData, LayerTopology, ModelSource, ProcessedNetwork};
pub use stats::{Statistics, STAT_FIELDS};
pub use value::{SettingType, SettingValue, ValueKind};
