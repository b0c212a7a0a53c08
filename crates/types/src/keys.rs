//! Registry of reserved settings keys
//!
//! Each reserved key carries its value type, so reads and writes through a
//! [`Key`] cannot change the semantic type of an entry. Settings named at
//! runtime (`<type>_<subtype>`) go through the store's dynamic API instead.

use crate::network::{ImportanceData, ProcessedNetwork};
use crate::value::{SettingType, ValueKind};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed handle to a settings entry
pub struct Key<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: SettingType> Key<T> {
    pub fn kind(&self) -> ValueKind {
        T::KIND
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

/// Session termination flag, set once and never unset
pub const CLOSED: Key<bool> = Key::new("Closed");
/// Neuron counts per layer
pub const CURRENT_LAYER_DATA: Key<Vec<i64>> = Key::new("current_layer_data");
pub const IMPORTANCE_DATA: Key<Arc<ImportanceData>> = Key::new("importance_data");
pub const PROCESSED_NN: Key<Arc<ProcessedNetwork>> = Key::new("processed_nn");
/// One-shot: rebuild the model from the current layer data
pub const UPDATE_MODEL: Key<bool> = Key::new("update_model");
/// One-shot: write the processed network to `save_processed_nn_path`
pub const SAVE_FILE: Key<bool> = Key::new("save_file");
pub const SAVE_PROCESSED_NN_PATH: Key<String> = Key::new("save_processed_nn_path");
/// One-shot: resample edges
pub const TRIGGER_NETWORK_SAMPLE: Key<i64> = Key::new("trigger_network_sample");
pub const NETWORK_NAME: Key<String> = Key::new("network_name");
/// Index of the current [`ActionState`](crate::ActionState)
pub const ACTION_STATE: Key<i64> = Key::new("action_state");
pub const EDGE_SMOOTHING: Key<i64> = Key::new("edge_smoothing");
/// Selected class visibility option index
pub const SHOW_CLASS: Key<i64> = Key::new("show_class");

// Statistics published by the frame loop
pub const EDGE_COUNT: Key<i64> = Key::new("edge_count");
pub const SAMPLE_COUNT: Key<i64> = Key::new("sample_count");
pub const CELL_COUNT: Key<i64> = Key::new("cell_count");
pub const PRUNED_EDGES: Key<i64> = Key::new("pruned_edges");
pub const FPS: Key<f64> = Key::new("fps");

/// Name and kind of every reserved key
pub fn reserved() -> &'static [(&'static str, ValueKind)] {
    &[
        ("Closed", ValueKind::Bool),
        ("current_layer_data", ValueKind::IntList),
        ("importance_data", ValueKind::Importance),
        ("processed_nn", ValueKind::Processed),
        ("update_model", ValueKind::Bool),
        ("save_file", ValueKind::Bool),
        ("save_processed_nn_path", ValueKind::Text),
        ("trigger_network_sample", ValueKind::Int),
        ("network_name", ValueKind::Text),
        ("action_state", ValueKind::Int),
        ("edge_smoothing", ValueKind::Int),
        ("show_class", ValueKind::Int),
        ("edge_count", ValueKind::Int),
        ("sample_count", ValueKind::Int),
        ("cell_count", ValueKind::Int),
        ("pruned_edges", ValueKind::Int),
        ("fps", ValueKind::Float),
    ]
}

/// Kind of a reserved key, `None` for dynamic names
pub fn reserved_kind(name: &str) -> Option<ValueKind> {
    reserved()
        .iter()
        .find(|(reserved_name, _)| *reserved_name == name)
        .map(|(_, kind)| *kind)
}

/// Name of a dynamically created `<type>_<subtype>` setting
pub fn dynamic_name(setting_type: &str, sub_type: &str) -> String {
    format!("{}_{}", setting_type, sub_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_table_matches_typed_keys() {
        assert_eq!(reserved_kind(CLOSED.name()), Some(CLOSED.kind()));
        assert_eq!(reserved_kind(CURRENT_LAYER_DATA.name()), Some(CURRENT_LAYER_DATA.kind()));
        assert_eq!(reserved_kind(PROCESSED_NN.name()), Some(PROCESSED_NN.kind()));
        assert_eq!(reserved_kind(TRIGGER_NETWORK_SAMPLE.name()), Some(TRIGGER_NETWORK_SAMPLE.kind()));
        assert_eq!(reserved_kind(FPS.name()), Some(FPS.kind()));
        assert_eq!(reserved_kind("render_whatever"), None);
    }

    #[test]
    fn test_dynamic_names_join_with_underscore() {
        assert_eq!(dynamic_name("action", "state"), ACTION_STATE.name());
        assert_eq!(dynamic_name("trigger_network", "sample"), TRIGGER_NETWORK_SAMPLE.name());
        assert_eq!(dynamic_name("show", "class"), SHOW_CLASS.name());
    }
}
