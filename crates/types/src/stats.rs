//! Statistics readout published by the frame loop

use serde::{Deserialize, Serialize};

/// Keys and labels of the statistics readout, in display order
pub const STAT_FIELDS: [(&str, &str); 5] = [
    ("edge_count", "Edges"),
    ("sample_count", "Samples"),
    ("cell_count", "Grid Cells"),
    ("pruned_edges", "Pruned Edges"),
    ("fps", "FPS"),
];

/// Snapshot of the statistics readout
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub edge_count: i64,
    pub sample_count: i64,
    pub cell_count: i64,
    pub pruned_edges: i64,
    pub fps: f64,
}

impl Statistics {
    /// `(label, formatted value)` rows in display order
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        STAT_FIELDS
            .iter()
            .map(|(key, label)| {
                let value = match *key {
                    "edge_count" => self.edge_count.to_string(),
                    "sample_count" => self.sample_count.to_string(),
                    "cell_count" => self.cell_count.to_string(),
                    "pruned_edges" => self.pruned_edges.to_string(),
                    _ => format!("{:.1}", self.fps),
                };
                (*label, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_field_order() {
        let stats = Statistics {
            edge_count: 120,
            fps: 59.94,
            ..Default::default()
        };
        let rows = stats.rows();
        assert_eq!(rows[0], ("Edges", "120".to_string()));
        assert_eq!(rows[4], ("FPS", "59.9".to_string()));
    }
}
