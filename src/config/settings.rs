//! Persisted render, processing and window configuration

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use super::defaults;

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// On-disk layout of a persisted config
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// A named JSON document of `key -> value`, stored next to its siblings
///
/// Values start from the defaults of the config kind; whatever is found on
/// disk overrides them key by key, so new defaults show up in old files.
#[derive(Debug, Clone)]
pub struct PersistedConfig {
    name: String,
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl PersistedConfig {
    /// Load `<dir>/<name>.json`, falling back to `defaults` when the file is missing
    pub fn load_from_dir(name: &str, dir: &Path, defaults: BTreeMap<String, Value>) -> Result<Self> {
        let path = dir.join(format!("{}.json", name));
        let mut config = Self {
            name: name.to_string(),
            path,
            values: defaults,
        };

        if !config.path.exists() {
            debug!("No {} config at {:?}, using defaults", name, config.path);
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config.path)
            .with_context(|| format!("Failed to read {} config {:?}", name, config.path))?;
        let file: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} config {:?}", name, config.path))?;
        if file.version != CONFIG_VERSION {
            warn!(
                "{} config has version {}, expected {}",
                name, file.version, CONFIG_VERSION
            );
        }
        config.values.extend(file.values);
        Ok(config)
    }

    /// Like [`load_from_dir`](Self::load_from_dir), but a broken file only costs its values
    pub fn load_or_default(name: &str, dir: &Path, defaults: BTreeMap<String, Value>) -> Self {
        match Self::load_from_dir(name, dir, defaults.clone()) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}; using defaults", e);
                Self {
                    name: name.to_string(),
                    path: dir.join(format!("{}.json", name)),
                    values: defaults,
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    /// Update a value in memory; call [`store`](Self::store) to persist it
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Persist the current in-memory values
    pub fn store(&self) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let file = ConfigFile {
            version: CONFIG_VERSION,
            values: self.values.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {} config {:?}", self.name, self.path))?;
        debug!("Stored {} config to {:?}", self.name, self.path);
        Ok(())
    }
}

/// Get the platform configuration directory
pub fn config_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "nnvis", "nnvis")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(dirs.config_dir().to_path_buf())
}

macro_rules! persisted_config {
    ($(#[$meta:meta])* $ty:ident, $name:literal, $defaults:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $ty(PersistedConfig);

        impl $ty {
            pub const NAME: &'static str = $name;

            pub fn load_from_dir(dir: &Path) -> Self {
                Self(PersistedConfig::load_or_default($name, dir, $defaults()))
            }
        }

        impl Deref for $ty {
            type Target = PersistedConfig;

            fn deref(&self) -> &PersistedConfig {
                &self.0
            }
        }

        impl DerefMut for $ty {
            fn deref_mut(&mut self) -> &mut PersistedConfig {
                &mut self.0
            }
        }
    };
}

persisted_config!(
    /// Shader and render mode settings for grid, edges and nodes
    RenderingConfig,
    "rendering",
    defaults::rendering
);

persisted_config!(
    /// Settings for the edge/node processing passes
    ProcessingConfig,
    "processing",
    defaults::processing
);

persisted_config!(
    /// Options window placement
    WindowConfig,
    "ui",
    defaults::window
);

/// The three configs the options panel edits
#[derive(Debug, Clone)]
pub struct ConfigSet {
    pub rendering: RenderingConfig,
    pub processing: ProcessingConfig,
    pub window: WindowConfig,
}

impl ConfigSet {
    /// Load every config from `dir`
    pub fn load_from_dir(dir: &Path) -> Self {
        info!("Loading configuration from {:?}", dir);
        Self {
            rendering: RenderingConfig::load_from_dir(dir),
            processing: ProcessingConfig::load_from_dir(dir),
            window: WindowConfig::load_from_dir(dir),
        }
    }

    /// Load every config from the platform config directory
    pub fn load() -> Result<Self> {
        Ok(Self::load_from_dir(&config_dir()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("nnvis-config-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = temp_dir();
        let config = RenderingConfig::load_from_dir(&dir);
        assert_eq!(config.get_i64("edge_render_mode"), Some(0));
        assert!(config.path().ends_with("rendering.json"));
    }

    #[test]
    fn test_store_then_load_keeps_changes() {
        let dir = temp_dir();
        let mut config = ProcessingConfig::load_from_dir(&dir);
        config.set("smoothing", 0);
        config.store().unwrap();

        let reloaded = ProcessingConfig::load_from_dir(&dir);
        assert_eq!(reloaded.get_i64("smoothing"), Some(0));
        // Untouched keys still come from the defaults
        assert_eq!(
            reloaded.get_f64("sampling_rate"),
            defaults::processing()["sampling_rate"].as_f64()
        );
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ui.json"), "{ not json").unwrap();

        assert!(PersistedConfig::load_from_dir("ui", &dir, defaults::window()).is_err());
        let config = WindowConfig::load_from_dir(&dir);
        assert_eq!(config.get_i64("screen_x"), Some(0));
        std::fs::remove_dir_all(dir).ok();
    }
}
