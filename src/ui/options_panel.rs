//! Options panel: handlers behind the statistics, architecture, render and processing groups
//!
//! The panel owns the editable layer list and the persisted configs, and
//! publishes everything the render loop needs through the shared
//! [`SettingsStore`]. Widgets call these handlers; nothing here touches a
//! toolkit directly.

use super::dialogs::{FileDialog, FileFilter, Prompt};
use crate::config::{ConfigSet, ProcessingConfig, RenderingConfig, WindowPositionSaver};
use crate::data::NetworkLoader;
use anyhow::Result;
use log::{debug, info, warn};
use nnvis_core::keys;
use nnvis_core::{
    ActionEvent, ActionState, LayerTopology, ModelSource, SettingValue, SettingsError,
    SettingsStore, Statistics, DEFAULT_LAYERS, WINDOW_SAVE_DEBOUNCE,
};
use nnvis_types::{class_options, DEFAULT_CLASS_COUNT};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Toolkit services the panel depends on
pub struct PanelServices {
    pub loader: Box<dyn NetworkLoader>,
    pub files: Box<dyn FileDialog>,
    pub prompt: Box<dyn Prompt>,
}

pub struct OptionsPanel {
    store: Arc<SettingsStore>,
    layers: Vec<u32>,
    class_options: Vec<String>,
    render_config: RenderingConfig,
    processing_config: ProcessingConfig,
    window: WindowPositionSaver,
    services: PanelServices,
}

impl OptionsPanel {
    pub fn new(store: Arc<SettingsStore>, configs: ConfigSet, services: PanelServices) -> Self {
        let panel = Self {
            store,
            layers: Vec::new(),
            class_options: class_options(DEFAULT_CLASS_COUNT),
            render_config: configs.rendering,
            processing_config: configs.processing,
            window: WindowPositionSaver::new(configs.window, WINDOW_SAVE_DEBOUNCE),
            services,
        };

        // The render loop reads smoothing from the store, seed it from the config
        let smoothing = panel.processing_config.get_i64("smoothing").unwrap_or(0);
        panel.store.set(keys::EDGE_SMOOTHING, smoothing);
        panel
    }

    /// Populate the layer list and request the first model
    pub fn start(&mut self, layers: Option<Vec<u32>>) -> Result<(), SettingsError> {
        let layers = layers.unwrap_or_else(|| DEFAULT_LAYERS.to_vec());
        for neurons in layers {
            self.add_layer(neurons);
        }
        let (x, y) = self.window.position();
        info!("Options panel started at ({}, {}) with layers {:?}", x, y, self.layers);
        self.generate()
    }

    pub fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    // - Architecture ---------------------------------------------------------------------------- //

    pub fn layers(&self) -> &[u32] {
        &self.layers
    }

    /// Append a layer; zero-neuron layers are rejected
    pub fn add_layer(&mut self, neurons: u32) -> bool {
        if neurons == 0 {
            warn!("Refusing to add a layer without neurons");
            return false;
        }
        self.layers.push(neurons);
        debug!("Added layer {} with {} neurons", self.layers.len() - 1, neurons);
        true
    }

    pub fn set_layer_neurons(&mut self, layer_id: usize, neurons: u32) -> bool {
        match self.layers.get_mut(layer_id) {
            Some(layer) if neurons > 0 => {
                *layer = neurons;
                true
            }
            _ => {
                warn!("Cannot set layer {} to {} neurons", layer_id, neurons);
                false
            }
        }
    }

    /// Remove one layer; the following layers move up one depth
    pub fn remove_layer(&mut self, layer_id: usize) -> bool {
        if layer_id >= self.layers.len() {
            warn!("No layer {} to remove ({} layers)", layer_id, self.layers.len());
            return false;
        }
        self.layers.remove(layer_id);
        true
    }

    pub fn clear_layers(&mut self) {
        self.layers.clear();
    }

    /// Generate a fresh network from the layer list
    pub fn generate(&mut self) -> Result<(), SettingsError> {
        self.generate_from(ModelSource::Topology)
    }

    fn generate_from(&mut self, source: ModelSource) -> Result<(), SettingsError> {
        self.store.apply_action(ActionEvent::Cancel);
        let topology = LayerTopology::new(self.layers.clone());
        self.store.request_model_update(&topology, source)?;
        if let Err(e) = self.processing_config.store() {
            warn!("Failed to store processing config: {:#}", e);
        }
        Ok(())
    }

    /// Replace the layer list with a loaded topology and regenerate from `source`
    pub fn update_layers(
        &mut self,
        topology: &LayerTopology,
        source: ModelSource,
    ) -> Result<(), SettingsError> {
        if topology.is_empty() {
            return Err(SettingsError::EmptyTopology);
        }
        self.clear_layers();
        for &neurons in topology.layers() {
            self.add_layer(neurons);
        }
        self.generate_from(source)?;
        if let Some(classes) = topology.output_size() {
            self.set_classes(classes);
        }
        Ok(())
    }

    /// "Load Network": pick an importance file and regenerate from it
    pub fn open_importance_file(&mut self) -> bool {
        match self
            .services
            .files
            .open_file("Select A File", FileFilter::ImportanceFiles)
        {
            Some(path) => self.load_importance_path(&path),
            None => {
                debug!("Load network cancelled");
                false
            }
        }
    }

    /// "Load Processed Network": pick a processed file and regenerate from it
    pub fn open_processed_file(&mut self) -> bool {
        match self
            .services
            .files
            .open_file("Select A File", FileFilter::ProcessedFiles)
        {
            Some(path) => self.load_processed_path(&path),
            None => {
                debug!("Load processed network cancelled");
                false
            }
        }
    }

    pub fn load_importance_path(&mut self, path: &Path) -> bool {
        let data = match self.services.loader.load_importance(path) {
            Ok(data) => data,
            Err(e) => {
                self.report_load_failure(&e);
                return false;
            }
        };
        let topology = data.layer_data.clone();
        self.finish_load(path, "_raw", &topology, ModelSource::Importance(Arc::new(data)))
    }

    pub fn load_processed_path(&mut self, path: &Path) -> bool {
        let network = match self.services.loader.load_processed(path) {
            Ok(network) => network,
            Err(e) => {
                self.report_load_failure(&e);
                return false;
            }
        };
        let topology = network.layer_data.clone();
        self.finish_load(
            path,
            "_processed",
            &topology,
            ModelSource::Processed(Arc::new(network)),
        )
    }

    fn finish_load(
        &mut self,
        path: &Path,
        suffix: &str,
        topology: &LayerTopology,
        source: ModelSource,
    ) -> bool {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Err(e) = self.update_layers(topology, source) {
            self.services.prompt.alert("Load failed", &e.to_string());
            return false;
        }
        self.store
            .set(keys::NETWORK_NAME, format!("{}{}", file_name, suffix));
        true
    }

    fn report_load_failure(&mut self, error: &crate::data::DataLoadError) {
        warn!("Network load failed: {}", error);
        self.services.prompt.alert("Load failed", &error.to_string());
    }

    /// "Save Processed Network": ask for a path and let the render loop write the file
    pub fn save_processed_file(&mut self) -> bool {
        match self.services.files.save_file("Save Processed Network") {
            Some(path) => {
                self.save_processed_to(&path);
                true
            }
            None => {
                debug!("Save processed network cancelled");
                false
            }
        }
    }

    pub fn save_processed_to(&mut self, path: &Path) {
        // Path first, so the reader never sees the flag without its argument
        self.store.set(
            keys::SAVE_PROCESSED_NN_PATH,
            path.to_string_lossy().into_owned(),
        );
        self.store.trigger(keys::SAVE_FILE, true, false);
        info!("Requested save of processed network to {:?}", path);
    }

    // - Processing ------------------------------------------------------------------------------ //

    /// Write a `<type>_<subtype>` setting, optionally stopping the running action first
    pub fn change_setting(
        &mut self,
        setting_type: &str,
        sub_type: &str,
        value: SettingValue,
        stop_action: bool,
    ) -> Result<(), SettingsError> {
        let name = keys::dynamic_name(setting_type, sub_type);
        if stop_action {
            self.store.trigger_dynamic(&name, value, true)
        } else {
            self.store.set_dynamic(&name, value)
        }
    }

    pub fn select_action(&mut self, action: ActionState) {
        self.store.apply_action(ActionEvent::Select(action));
    }

    /// "Resample Edges": stops the running action, then requests one resample
    pub fn resample_edges(&mut self) {
        self.store.trigger(keys::TRIGGER_NETWORK_SAMPLE, 1, true);
    }

    pub fn set_smoothing(&mut self, enabled: bool) -> Result<()> {
        let value = i64::from(enabled);
        self.store.set(keys::EDGE_SMOOTHING, value);
        self.change_processing_config("smoothing", value)
    }

    pub fn change_processing_config(
        &mut self,
        name: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<()> {
        self.processing_config.set(name, value);
        self.processing_config.store()
    }

    pub fn processing_config(&self) -> &ProcessingConfig {
        &self.processing_config
    }

    // - Render ---------------------------------------------------------------------------------- //

    pub fn change_render_config(
        &mut self,
        name: &str,
        value: impl Into<serde_json::Value>,
        stop_action: bool,
    ) -> Result<()> {
        if stop_action {
            self.store.apply_action(ActionEvent::Cancel);
        }
        self.render_config.set(name, value);
        self.render_config.store()
    }

    pub fn render_config(&self) -> &RenderingConfig {
        &self.render_config
    }

    pub fn class_options(&self) -> &[String] {
        &self.class_options
    }

    /// Rebuild the class visibility options for `num_classes` output classes
    ///
    /// A selection that no longer exists falls back to `Independent`.
    pub fn set_classes(&mut self, num_classes: u32) {
        self.class_options = class_options(num_classes);
        let selected = self.store.get(keys::SHOW_CLASS);
        if let Some(index) = selected {
            if usize::try_from(index).map_or(true, |i| i >= self.class_options.len()) {
                self.store.set(keys::SHOW_CLASS, 0);
            }
        }
        debug!("Class options: {:?}", self.class_options);
    }

    pub fn show_class(&mut self, option: usize) -> bool {
        if option >= self.class_options.len() {
            warn!("No class visibility option {}", option);
            return false;
        }
        self.store.set(keys::SHOW_CLASS, option as i64);
        true
    }

    // - Statistics / window --------------------------------------------------------------------- //

    pub fn statistics(&self) -> Statistics {
        self.store.statistics()
    }

    /// Window moved or resized
    pub fn handle_configure(&mut self, x: i64, y: i64) {
        self.window.record(x, y, Instant::now());
    }

    /// Periodic housekeeping from the UI loop
    pub fn tick(&mut self, now: Instant) {
        if let Err(e) = self.window.flush_if_due(now) {
            warn!("Failed to store window position: {:#}", e);
        }
    }

    pub fn window_position(&self) -> (i64, i64) {
        self.window.position()
    }

    /// Window close request; returns whether the session is now closed
    ///
    /// Unsaved processed-network state is discarded on purpose.
    pub fn on_closing(&mut self) -> bool {
        if !self
            .services
            .prompt
            .ask_ok_cancel("Quit", "Do you want to quit?")
        {
            return false;
        }
        self.shutdown();
        true
    }

    /// End of the UI loop: mark the session closed and flush the window position
    pub fn shutdown(&mut self) {
        self.store.mark_closed();
        if let Err(e) = self.window.flush() {
            warn!("Failed to store window position: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoadError;
    use nnvis_types::{ImportanceData, ProcessedNetwork};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Loader answering from memory; unknown paths fail like a missing file
    #[derive(Default)]
    struct FakeLoader {
        importance: Option<ImportanceData>,
        processed: Option<ProcessedNetwork>,
    }

    fn missing(path: &Path) -> DataLoadError {
        DataLoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        }
    }

    impl NetworkLoader for FakeLoader {
        fn load_importance(&self, path: &Path) -> Result<ImportanceData, DataLoadError> {
            self.importance.clone().ok_or_else(|| missing(path))
        }

        fn load_processed(&self, path: &Path) -> Result<ProcessedNetwork, DataLoadError> {
            self.processed.clone().ok_or_else(|| missing(path))
        }
    }

    /// Scripted dialogs that record what they were asked
    #[derive(Default)]
    struct Script {
        paths: VecDeque<Option<PathBuf>>,
        answers: VecDeque<bool>,
        questions: Vec<String>,
        alerts: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct FakeDialogs(Rc<RefCell<Script>>);

    impl FileDialog for FakeDialogs {
        fn open_file(&mut self, _title: &str, _filter: FileFilter) -> Option<PathBuf> {
            self.0.borrow_mut().paths.pop_front().flatten()
        }

        fn save_file(&mut self, _title: &str) -> Option<PathBuf> {
            self.0.borrow_mut().paths.pop_front().flatten()
        }
    }

    impl Prompt for FakeDialogs {
        fn ask_ok_cancel(&mut self, title: &str, message: &str) -> bool {
            let mut script = self.0.borrow_mut();
            script.questions.push(format!("{}: {}", title, message));
            script.answers.pop_front().unwrap_or(false)
        }

        fn alert(&mut self, title: &str, message: &str) {
            self.0
                .borrow_mut()
                .alerts
                .push(format!("{}: {}", title, message));
        }
    }

    struct Harness {
        panel: OptionsPanel,
        store: Arc<SettingsStore>,
        dialogs: FakeDialogs,
        dir: PathBuf,
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.dir).ok();
        }
    }

    fn harness(loader: FakeLoader) -> Harness {
        let dir = std::env::temp_dir().join(format!("nnvis-panel-{}", uuid::Uuid::new_v4()));
        let store = Arc::new(SettingsStore::new());
        let dialogs = FakeDialogs::default();
        let services = PanelServices {
            loader: Box::new(loader),
            files: Box::new(dialogs.clone()),
            prompt: Box::new(dialogs.clone()),
        };
        let panel = OptionsPanel::new(Arc::clone(&store), ConfigSet::load_from_dir(&dir), services);
        Harness {
            panel,
            store,
            dialogs,
            dir,
        }
    }

    fn importance(layers: Vec<u32>) -> ImportanceData {
        ImportanceData {
            layer_data: LayerTopology::new(layers),
            importance: Vec::new(),
        }
    }

    #[test]
    fn test_start_generates_default_network() {
        let mut h = harness(FakeLoader::default());
        h.panel.start(None).unwrap();

        assert_eq!(h.panel.layers(), &[4, 9, 9]);
        assert_eq!(h.store.get(keys::CURRENT_LAYER_DATA), Some(vec![4, 9, 9]));
        assert_eq!(h.store.consume_once(keys::UPDATE_MODEL), Some(true));
        assert_eq!(h.store.consume_once(keys::UPDATE_MODEL), None);
        assert!(h.dir.join("processing.json").exists());
    }

    #[test]
    fn test_generate_stops_running_action() {
        let mut h = harness(FakeLoader::default());
        h.panel.start(Some(vec![3, 5])).unwrap();
        h.panel.select_action(ActionState::NodeNoise);

        h.panel.add_layer(2);
        h.panel.generate().unwrap();

        assert_eq!(h.store.action(), ActionState::Stop);
        assert_eq!(h.store.get(keys::CURRENT_LAYER_DATA), Some(vec![3, 5, 2]));
    }

    #[test]
    fn test_generate_without_layers_is_rejected() {
        let mut h = harness(FakeLoader::default());
        assert!(matches!(h.panel.generate(), Err(SettingsError::EmptyTopology)));
        assert_eq!(h.store.get(keys::UPDATE_MODEL), None);
    }

    #[test]
    fn test_resample_from_edge_advect_stops_and_triggers() {
        let mut h = harness(FakeLoader::default());
        h.panel.select_action(ActionState::EdgeAdvect);
        h.panel.resample_edges();

        assert_eq!(h.store.action(), ActionState::Stop);
        assert_eq!(h.store.get(keys::ACTION_STATE), Some(0));
        assert_eq!(h.store.consume_once(keys::TRIGGER_NETWORK_SAMPLE), Some(1));
    }

    #[test]
    fn test_loaded_network_sets_classes_and_name() {
        let mut h = harness(FakeLoader {
            importance: Some(importance(vec![4, 9, 2])),
            ..Default::default()
        });
        h.dialogs
            .0
            .borrow_mut()
            .paths
            .push_back(Some(PathBuf::from("/data/iris.json")));

        assert!(h.panel.open_importance_file());
        assert_eq!(h.panel.layers(), &[4, 9, 2]);
        assert_eq!(
            h.panel.class_options(),
            &["Independent", "All", "Class 0", "Class 1"]
        );
        assert_eq!(
            h.store.get(keys::NETWORK_NAME),
            Some("iris.json_raw".to_string())
        );
        assert!(h.store.get(keys::IMPORTANCE_DATA).is_some());
        assert_eq!(h.store.get(keys::UPDATE_MODEL), Some(true));
    }

    #[test]
    fn test_processed_load_clears_importance_data() {
        let mut h = harness(FakeLoader {
            importance: Some(importance(vec![2, 2])),
            processed: Some(ProcessedNetwork {
                layer_data: LayerTopology::new(vec![3, 4]),
                artifacts: serde_json::Map::new(),
            }),
        });
        assert!(h.panel.load_importance_path(Path::new("a.json")));
        assert!(h.panel.load_processed_path(Path::new("b.json")));

        assert_eq!(h.store.get(keys::IMPORTANCE_DATA), None);
        assert!(h.store.get(keys::PROCESSED_NN).is_some());
        assert_eq!(
            h.store.get(keys::NETWORK_NAME),
            Some("b.json_processed".to_string())
        );
    }

    #[test]
    fn test_failed_load_alerts_and_keeps_state() {
        let mut h = harness(FakeLoader::default());
        h.panel.start(Some(vec![5, 5])).unwrap();
        h.store.consume_once(keys::UPDATE_MODEL);

        assert!(!h.panel.load_importance_path(Path::new("/missing.json")));

        assert_eq!(h.panel.layers(), &[5, 5]);
        assert_eq!(h.store.get(keys::UPDATE_MODEL), None);
        assert_eq!(h.store.get(keys::NETWORK_NAME), None);
        let alerts = h.dialogs.0.borrow().alerts.clone();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Load failed"));
    }

    #[test]
    fn test_cancelled_dialogs_change_nothing() {
        let mut h = harness(FakeLoader {
            importance: Some(importance(vec![4, 9, 2])),
            ..Default::default()
        });
        let revision = h.store.revision();

        assert!(!h.panel.open_importance_file());
        assert!(!h.panel.open_processed_file());
        assert!(!h.panel.save_processed_file());

        assert_eq!(h.store.revision(), revision);
        assert!(h.panel.layers().is_empty());
    }

    #[test]
    fn test_save_sets_path_before_flag() {
        let mut h = harness(FakeLoader::default());
        h.dialogs
            .0
            .borrow_mut()
            .paths
            .push_back(Some(PathBuf::from("/tmp/out.json")));

        assert!(h.panel.save_processed_file());
        assert_eq!(
            h.store.get(keys::SAVE_PROCESSED_NN_PATH),
            Some("/tmp/out.json".to_string())
        );
        assert_eq!(h.store.consume_once(keys::SAVE_FILE), Some(true));
    }

    #[test]
    fn test_quit_needs_confirmation() {
        let mut h = harness(FakeLoader::default());
        h.dialogs.0.borrow_mut().answers.extend([false, true]);

        assert!(!h.panel.on_closing());
        assert!(!h.store.is_closed());

        assert!(h.panel.on_closing());
        assert!(h.store.is_closed());
        assert_eq!(
            h.dialogs.0.borrow().questions,
            vec!["Quit: Do you want to quit?", "Quit: Do you want to quit?"]
        );
    }

    #[test]
    fn test_change_setting_keeps_established_kind() {
        let mut h = harness(FakeLoader::default());
        h.panel
            .change_setting("edge", "bandwidth", SettingValue::Float(0.5), false)
            .unwrap();
        h.panel.select_action(ActionState::EdgeDiverge);

        let err = h
            .panel
            .change_setting("edge", "bandwidth", SettingValue::Text("wide".into()), true)
            .unwrap_err();
        assert!(matches!(err, SettingsError::TypeMismatch { .. }));
        assert_eq!(h.store.get_value("edge_bandwidth"), SettingValue::Float(0.5));
        assert_eq!(h.store.action(), ActionState::EdgeDiverge);

        h.panel
            .change_setting("edge", "bandwidth", SettingValue::Float(0.8), true)
            .unwrap();
        assert_eq!(h.store.action(), ActionState::Stop);
    }

    #[test]
    fn test_out_of_range_class_falls_back_to_independent() {
        let mut h = harness(FakeLoader::default());
        assert!(h.panel.show_class(8));
        h.panel.set_classes(2);
        assert_eq!(h.store.get(keys::SHOW_CLASS), Some(0));
        assert!(!h.panel.show_class(4));
    }

    #[test]
    fn test_smoothing_reaches_store_and_config() {
        let mut h = harness(FakeLoader::default());
        h.panel.set_smoothing(false).unwrap();

        assert_eq!(h.store.get(keys::EDGE_SMOOTHING), Some(0));
        assert_eq!(h.panel.processing_config().get_i64("smoothing"), Some(0));
        let reloaded = ConfigSet::load_from_dir(&h.dir);
        assert_eq!(reloaded.processing.get_i64("smoothing"), Some(0));
    }

    #[test]
    fn test_window_position_survives_restart() {
        let mut h = harness(FakeLoader::default());
        h.panel.handle_configure(120, 80);
        h.panel.shutdown();

        let reloaded = ConfigSet::load_from_dir(&h.dir);
        assert_eq!(reloaded.window.get_i64("screen_x"), Some(120));
        assert_eq!(reloaded.window.get_i64("screen_y"), Some(80));
    }
}
