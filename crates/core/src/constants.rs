//! Shared constants for the frame loop

use std::time::Duration;

/// Frame interval for the ~60fps render/processing poll (16ms)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Quiet period before a burst of window moves is written to disk
pub const WINDOW_SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Neuron count for a layer added without an explicit size
pub const DEFAULT_LAYER_NEURONS: u32 = 9;

/// Layers used when the session starts without a network
pub const DEFAULT_LAYERS: [u32; 3] = [4, 9, 9];
