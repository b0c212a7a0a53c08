//! Network file loading
//!
//! Loaders run on the UI thread before the settings store is touched; a
//! failed load never leaves a partially updated topology behind.

mod loader;

pub use loader::{DataLoadError, JsonNetworkLoader, NetworkLoader};
