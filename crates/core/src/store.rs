//! Shared settings store - the single channel between the options UI and the render loop
//!
//! The UI thread writes discrete updates, the render/processing loop polls the
//! store once per frame. All entries live behind one `RwLock` holding an
//! `Arc<HashMap>`, so a per-frame snapshot is a cheap `Arc` clone and writes
//! copy-on-write only while a snapshot is still alive.
//!
//! One-shot flags (`update_model`, `save_file`, `trigger_network_sample`) are
//! consumed with [`SettingsStore::consume_once`], which removes the entry under
//! the write lock. A flag raised once is therefore handled exactly once, even
//! when the writer raises it again while the reader is mid-frame.
//!
//! Every public write and removal passes the reserved-key rules: `Closed` is
//! never unset, `update_model` and its data travel only in the model-update
//! batch, and `action_state` always names a selector state.

use crate::error::SettingsError;
use log::{debug, info, trace, warn};
use nnvis_types::keys::{self, Key};
use nnvis_types::{
    ActionEvent, ActionState, LayerTopology, ModelSource, SettingType, SettingValue, Statistics,
    ValueKind,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Entries = HashMap<String, SettingValue>;

/// Keys written only by [`SettingsStore::request_model_update`]
const MODEL_BATCH_KEYS: [&str; 4] = [
    keys::UPDATE_MODEL.name(),
    keys::CURRENT_LAYER_DATA.name(),
    keys::IMPORTANCE_DATA.name(),
    keys::PROCESSED_NN.name(),
];

/// Keys that must always hold a value
const NOT_REMOVABLE_KEYS: [&str; 3] = [
    keys::CLOSED.name(),
    keys::CURRENT_LAYER_DATA.name(),
    keys::ACTION_STATE.name(),
];

struct Inner {
    entries: Arc<Entries>,
    /// Kind established by the first writer of each key; survives clears
    kinds: HashMap<String, ValueKind>,
    revision: u64,
}

impl Inner {
    fn established_kind(&self, name: &str) -> Option<ValueKind> {
        self.kinds
            .get(name)
            .copied()
            .or_else(|| keys::reserved_kind(name))
    }

    fn check_kind(&self, name: &str, value: &SettingValue) -> Result<(), SettingsError> {
        let (Some(expected), Some(found)) = (self.established_kind(name), value.kind()) else {
            // Null clears any kind, and the first write establishes one
            return Ok(());
        };
        if expected == found {
            Ok(())
        } else {
            Err(SettingsError::TypeMismatch {
                key: name.to_string(),
                expected,
                found,
            })
        }
    }

    /// Kind check plus the rules of the reserved keys, for every public write
    ///
    /// The model-update batch owns `update_model`, `current_layer_data` and the
    /// two data objects; `Closed` only moves to true; `action_state` stays a
    /// valid selector index.
    fn check_write(&self, name: &str, value: &SettingValue) -> Result<(), SettingsError> {
        self.check_kind(name, value)?;
        match name {
            n if n == keys::CLOSED.name() => match value {
                SettingValue::Bool(true) => Ok(()),
                _ => Err(SettingsError::SessionClosed),
            },
            n if MODEL_BATCH_KEYS.contains(&n) => Err(SettingsError::ModelUpdateOnly {
                key: n.to_string(),
            }),
            n if n == keys::ACTION_STATE.name() => {
                let index = value.as_int().unwrap_or(-1);
                match ActionState::from_index(index) {
                    Some(_) => Ok(()),
                    None => Err(SettingsError::InvalidAction(index)),
                }
            }
            _ => Ok(()),
        }
    }

    fn check_remove(&self, name: &str) -> Result<(), SettingsError> {
        if NOT_REMOVABLE_KEYS.contains(&name) {
            Err(SettingsError::NotRemovable {
                key: name.to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn write(&mut self, name: &str, value: SettingValue) {
        if let Some(kind) = value.kind() {
            self.kinds.entry(name.to_string()).or_insert(kind);
        }
        Arc::make_mut(&mut self.entries).insert(name.to_string(), value);
        self.revision += 1;
    }

    fn remove(&mut self, name: &str) -> Option<SettingValue> {
        if !self.entries.contains_key(name) {
            return None;
        }
        let removed = Arc::make_mut(&mut self.entries).remove(name);
        self.revision += 1;
        removed
    }

    fn action(&self) -> ActionState {
        self.entries
            .get(keys::ACTION_STATE.name())
            .and_then(SettingValue::as_int)
            .and_then(ActionState::from_index)
            .unwrap_or_default()
    }

    fn apply_action(&mut self, event: ActionEvent) -> ActionState {
        let current = self.action();
        let next = current.transition(event);
        if next != current || !self.entries.contains_key(keys::ACTION_STATE.name()) {
            self.write(keys::ACTION_STATE.name(), SettingValue::Int(next.index()));
        }
        debug!("Action {:?} --{:?}--> {:?}", current, event, next);
        next
    }
}

/// Process-wide settings shared between the UI and the render loop
pub struct SettingsStore {
    inner: RwLock<Inner>,
}

impl SettingsStore {
    /// Create a store holding the session defaults
    ///
    /// `Closed` starts false, `current_layer_data` empty and the action
    /// selector at `Stop`.
    pub fn new() -> Self {
        let mut inner = Inner {
            entries: Arc::new(HashMap::new()),
            kinds: HashMap::new(),
            revision: 0,
        };
        inner.write(keys::CLOSED.name(), SettingValue::Bool(false));
        inner.write(keys::CURRENT_LAYER_DATA.name(), SettingValue::IntList(Vec::new()));
        inner.write(
            keys::ACTION_STATE.name(),
            SettingValue::Int(ActionState::Stop.index()),
        );
        Self {
            inner: RwLock::new(inner),
        }
    }

    // A panic on another thread must not take the store down with it
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Read a typed entry; absent (or cleared) entries return `None`
    pub fn get<T: SettingType>(&self, key: Key<T>) -> Option<T> {
        self.read().entries.get(key.name()).and_then(T::from_value)
    }

    /// Read an entry by name; absent entries return `SettingValue::Null`
    pub fn get_value(&self, name: &str) -> SettingValue {
        self.read().entries.get(name).cloned().unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().entries.contains_key(name)
    }

    /// Overwrite a typed entry
    ///
    /// Writes the reserved-key rules refuse (unsetting `Closed`, touching the
    /// model-update batch, an out-of-range action index) and writes through a
    /// hand-made key whose name already has another kind are ignored and logged.
    pub fn set<T: SettingType>(&self, key: Key<T>, value: T) {
        let value = value.into_value();
        let mut inner = self.write();
        if let Err(e) = inner.check_write(key.name(), &value) {
            warn!("Ignoring write: {}", e);
            return;
        }
        debug!("Setting {} = {:?}", key.name(), value);
        inner.write(key.name(), value);
    }

    /// Write a setting whose name is built at runtime (`<type>_<subtype>`)
    ///
    /// The entry is created on first write. Later writes must keep the kind
    /// established by the first writer; `Null` is accepted for any kind.
    /// Reserved names are held to the same rules as [`set`](Self::set).
    pub fn set_dynamic(&self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        let mut inner = self.write();
        inner.check_write(name, &value)?;
        debug!("Setting {} = {:?}", name, value);
        inner.write(name, value);
        Ok(())
    }

    /// Raise a one-shot flag
    ///
    /// With `reset_action` the action selector is first moved back to `Stop`,
    /// under the same lock, so the reader never sees the new flag together
    /// with the previous action.
    pub fn trigger<T: SettingType>(&self, key: Key<T>, value: T, reset_action: bool) {
        let value = value.into_value();
        let mut inner = self.write();
        if let Err(e) = inner.check_write(key.name(), &value) {
            warn!("Ignoring trigger: {}", e);
            return;
        }
        if reset_action {
            inner.apply_action(ActionEvent::Cancel);
        }
        debug!("Trigger {} = {:?}", key.name(), value);
        inner.write(key.name(), value);
    }

    /// Dynamic counterpart of [`trigger`](Self::trigger)
    pub fn trigger_dynamic(
        &self,
        name: &str,
        value: SettingValue,
        reset_action: bool,
    ) -> Result<(), SettingsError> {
        let mut inner = self.write();
        inner.check_write(name, &value)?;
        if reset_action {
            inner.apply_action(ActionEvent::Cancel);
        }
        debug!("Trigger {} = {:?}", name, value);
        inner.write(name, value);
        Ok(())
    }

    /// Read and clear a one-shot entry
    ///
    /// Returns the last written value exactly once; the next call returns
    /// `None` until the entry is written again.
    pub fn consume_once<T: SettingType>(&self, key: Key<T>) -> Option<T> {
        let mut inner = self.write();
        if let Err(e) = inner.check_remove(key.name()) {
            warn!("Refusing to consume: {}", e);
            return None;
        }
        let removed = inner.remove(key.name())?;
        trace!("Consumed {} = {:?}", key.name(), removed);
        T::from_value(&removed)
    }

    /// Consume a one-shot entry together with a snapshot taken under the same lock
    ///
    /// The snapshot shows exactly the data that was published with the flag,
    /// even if the writer publishes again right after.
    pub fn consume_with_snapshot<T: SettingType>(
        &self,
        key: Key<T>,
    ) -> Option<(T, SettingsSnapshot)> {
        let mut inner = self.write();
        if let Err(e) = inner.check_remove(key.name()) {
            warn!("Refusing to consume: {}", e);
            return None;
        }
        let removed = inner.remove(key.name())?;
        trace!("Consumed {} = {:?}", key.name(), removed);
        let value = T::from_value(&removed)?;
        let snapshot = SettingsSnapshot {
            entries: Arc::clone(&inner.entries),
            revision: inner.revision,
        };
        Some((value, snapshot))
    }

    /// Remove an entry; returns whether it existed
    ///
    /// `Closed`, `current_layer_data` and `action_state` always hold a value
    /// and are never removed.
    pub fn clear<T>(&self, key: Key<T>) -> bool {
        self.clear_name(key.name())
    }

    pub fn clear_name(&self, name: &str) -> bool {
        let mut inner = self.write();
        if let Err(e) = inner.check_remove(name) {
            warn!("Refusing to clear: {}", e);
            return false;
        }
        inner.remove(name).is_some()
    }

    /// Current action selector state
    pub fn action(&self) -> ActionState {
        self.read().action()
    }

    /// Feed an event through the action state machine and store the result
    pub fn apply_action(&self, event: ActionEvent) -> ActionState {
        self.write().apply_action(event)
    }

    /// Publish a model generation request as one atomic batch
    ///
    /// Writes `current_layer_data`, the data object for `source` (clearing the
    /// other one) and raises `update_model`. An empty topology is rejected so
    /// that `update_model` is never visible without at least one layer.
    pub fn request_model_update(
        &self,
        topology: &LayerTopology,
        source: ModelSource,
    ) -> Result<(), SettingsError> {
        if topology.is_empty() {
            return Err(SettingsError::EmptyTopology);
        }

        let (importance, processed) = match source {
            ModelSource::Topology => (SettingValue::Null, SettingValue::Null),
            ModelSource::Importance(data) => (SettingValue::Importance(data), SettingValue::Null),
            ModelSource::Processed(data) => (SettingValue::Null, SettingValue::Processed(data)),
        };

        let mut inner = self.write();
        inner.write(
            keys::CURRENT_LAYER_DATA.name(),
            SettingValue::IntList(topology.to_setting()),
        );
        inner.write(keys::IMPORTANCE_DATA.name(), importance);
        inner.write(keys::PROCESSED_NN.name(), processed);
        inner.write(keys::UPDATE_MODEL.name(), SettingValue::Bool(true));
        info!("Requested model update for layers {:?}", topology.layers());
        Ok(())
    }

    /// Set the session termination flag; it is never unset
    pub fn mark_closed(&self) {
        let mut inner = self.write();
        if inner.entries.get(keys::CLOSED.name()).and_then(SettingValue::as_bool) != Some(true) {
            inner.write(keys::CLOSED.name(), SettingValue::Bool(true));
            info!("Session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.get(keys::CLOSED).unwrap_or(false)
    }

    /// Write the statistics readout in one batch
    pub fn publish_statistics(&self, stats: &Statistics) {
        let mut inner = self.write();
        inner.write(keys::EDGE_COUNT.name(), SettingValue::Int(stats.edge_count));
        inner.write(keys::SAMPLE_COUNT.name(), SettingValue::Int(stats.sample_count));
        inner.write(keys::CELL_COUNT.name(), SettingValue::Int(stats.cell_count));
        inner.write(keys::PRUNED_EDGES.name(), SettingValue::Int(stats.pruned_edges));
        inner.write(keys::FPS.name(), SettingValue::Float(stats.fps));
    }

    /// Statistics readout; missing fields read as zero
    pub fn statistics(&self) -> Statistics {
        self.snapshot().statistics()
    }

    /// Consistent view of every entry, for the per-frame read
    pub fn snapshot(&self) -> SettingsSnapshot {
        let inner = self.read();
        SettingsSnapshot {
            entries: Arc::clone(&inner.entries),
            revision: inner.revision,
        }
    }

    /// Counter bumped by every write, clear and consume
    pub fn revision(&self) -> u64 {
        self.read().revision
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable view of the store at one revision
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    entries: Arc<Entries>,
    revision: u64,
}

impl SettingsSnapshot {
    pub fn get<T: SettingType>(&self, key: Key<T>) -> Option<T> {
        self.entries.get(key.name()).and_then(T::from_value)
    }

    pub fn get_value(&self, name: &str) -> SettingValue {
        self.entries.get(name).cloned().unwrap_or_default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn action(&self) -> ActionState {
        self.get(keys::ACTION_STATE)
            .and_then(ActionState::from_index)
            .unwrap_or_default()
    }

    pub fn layers(&self) -> LayerTopology {
        self.get(keys::CURRENT_LAYER_DATA)
            .map(|values| LayerTopology::from_setting(&values))
            .unwrap_or_default()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            edge_count: self.get(keys::EDGE_COUNT).unwrap_or(0),
            sample_count: self.get(keys::SAMPLE_COUNT).unwrap_or(0),
            cell_count: self.get(keys::CELL_COUNT).unwrap_or(0),
            pruned_edges: self.get(keys::PRUNED_EDGES).unwrap_or(0),
            fps: self.get(keys::FPS).unwrap_or(0.0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// Global settings store instance
use once_cell::sync::OnceCell;
static GLOBAL_SETTINGS_STORE: OnceCell<Arc<SettingsStore>> = OnceCell::new();

/// Initialize the global settings store. Call this once at startup.
pub fn init_global_store(store: Arc<SettingsStore>) {
    if GLOBAL_SETTINGS_STORE.set(store).is_err() {
        warn!("Global settings store already initialized");
    }
}

/// Get the global settings store. Returns None if not initialized.
pub fn global_store() -> Option<&'static Arc<SettingsStore>> {
    GLOBAL_SETTINGS_STORE.get()
}
