//! Loaders for raw importance networks and processed networks

use log::{debug, info};
use nnvis_types::{ImportanceData, LayerTopology, ProcessedNetwork};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to turn a network file into layer topology + data
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} describes a network without layers", .path.display())]
    EmptyTopology { path: PathBuf },
    #[error("{}: layer {index} has no neurons", .path.display())]
    InvalidLayer { path: PathBuf, index: usize },
    #[error(
        "{}: importance between layers {layer} and {} should hold {expected} values, found {found}",
        .path.display(),
        .layer + 1
    )]
    ImportanceShape {
        path: PathBuf,
        layer: usize,
        expected: usize,
        found: usize,
    },
}

/// Parses network files into layer topology plus data
pub trait NetworkLoader {
    /// Load a raw network with per-edge importance values
    fn load_importance(&self, path: &Path) -> Result<ImportanceData, DataLoadError>;

    /// Load a previously processed network
    fn load_processed(&self, path: &Path) -> Result<ProcessedNetwork, DataLoadError>;
}

/// Reads networks stored as JSON documents
///
/// Importance files: `{"layer_data": [4, 9, 2], "importance": [[...36], [...18]]}`.
/// Processed files: `{"layer_data": [...], "artifacts": {...}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonNetworkLoader;

impl JsonNetworkLoader {
    fn read<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| DataLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl NetworkLoader for JsonNetworkLoader {
    fn load_importance(&self, path: &Path) -> Result<ImportanceData, DataLoadError> {
        let data: ImportanceData = Self::read(path)?;
        validate_topology(&data.layer_data, path)?;

        // Empty importance means "uniform"; otherwise one matrix per transition
        if !data.importance.is_empty() {
            let layers = data.layer_data.layers();
            for (layer, pair) in layers.windows(2).enumerate() {
                let expected = pair[0] as usize * pair[1] as usize;
                let found = data.importance.get(layer).map_or(0, Vec::len);
                if found != expected {
                    return Err(DataLoadError::ImportanceShape {
                        path: path.to_path_buf(),
                        layer,
                        expected,
                        found,
                    });
                }
            }
        }

        info!(
            "Loaded importance network {:?} with layers {:?}",
            path,
            data.layer_data.layers()
        );
        Ok(data)
    }

    fn load_processed(&self, path: &Path) -> Result<ProcessedNetwork, DataLoadError> {
        let network: ProcessedNetwork = Self::read(path)?;
        validate_topology(&network.layer_data, path)?;
        debug!("Processed network carries {} artifacts", network.artifacts.len());
        info!(
            "Loaded processed network {:?} with layers {:?}",
            path,
            network.layer_data.layers()
        );
        Ok(network)
    }
}

fn validate_topology(topology: &LayerTopology, path: &Path) -> Result<(), DataLoadError> {
    if topology.is_empty() {
        return Err(DataLoadError::EmptyTopology {
            path: path.to_path_buf(),
        });
    }
    if let Some(index) = topology.layers().iter().position(|&n| n == 0) {
        return Err(DataLoadError::InvalidLayer {
            path: path.to_path_buf(),
            index,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("nnvis-net-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_importance_without_matrices() {
        let path = write_temp(r#"{"layer_data": [4, 9, 2]}"#);
        let data = JsonNetworkLoader.load_importance(&path).unwrap();
        assert_eq!(data.layer_data.layers(), &[4, 9, 2]);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_importance_shape_is_checked() {
        let path = write_temp(r#"{"layer_data": [2, 2], "importance": [[0.1, 0.2, 0.3]]}"#);
        let err = JsonNetworkLoader.load_importance(&path).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::ImportanceShape {
                expected: 4,
                found: 3,
                ..
            }
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("nnvis-does-not-exist.json");
        let err = JsonNetworkLoader.load_processed(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let path = write_temp("PK\u{3}\u{4} not json");
        let err = JsonNetworkLoader.load_importance(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::Parse { .. }));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_empty_and_zero_layers_are_rejected() {
        let empty = write_temp(r#"{"layer_data": []}"#);
        assert!(matches!(
            JsonNetworkLoader.load_processed(&empty).unwrap_err(),
            DataLoadError::EmptyTopology { .. }
        ));
        let zero = write_temp(r#"{"layer_data": [3, 0, 2]}"#);
        assert!(matches!(
            JsonNetworkLoader.load_processed(&zero).unwrap_err(),
            DataLoadError::InvalidLayer { index: 1, .. }
        ));
        std::fs::remove_file(empty).ok();
        std::fs::remove_file(zero).ok();
    }
}
