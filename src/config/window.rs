//! Debounced persistence of the options window position
//!
//! Move/resize events arrive in bursts. Each event only records the new
//! position; the file is written once the position has been stable for the
//! debounce period, and again on close.

use super::WindowConfig;
use anyhow::Result;
use log::{debug, info};
use std::time::{Duration, Instant};

pub struct WindowPositionSaver {
    config: WindowConfig,
    debounce: Duration,
    dirty: bool,
    last_change: Option<Instant>,
    writes: u64,
}

impl WindowPositionSaver {
    pub fn new(config: WindowConfig, debounce: Duration) -> Self {
        Self {
            config,
            debounce,
            dirty: false,
            last_change: None,
            writes: 0,
        }
    }

    /// Position restored at startup
    pub fn position(&self) -> (i64, i64) {
        (
            self.config.get_i64("screen_x").unwrap_or(0),
            self.config.get_i64("screen_y").unwrap_or(0),
        )
    }

    /// Record a configure event; unchanged positions do not restart the timer
    pub fn record(&mut self, x: i64, y: i64, now: Instant) {
        if self.position() == (x, y) {
            return;
        }
        self.config.set("screen_x", x);
        self.config.set("screen_y", y);
        self.dirty = true;
        self.last_change = Some(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of times the config was written to disk
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Write the position if it has been stable for the debounce period
    pub fn flush_if_due(&mut self, now: Instant) -> Result<bool> {
        match self.last_change {
            Some(changed) if self.dirty && now.duration_since(changed) >= self.debounce => {
                self.flush()
            }
            _ => Ok(false),
        }
    }

    /// Write the position now if it changed since the last write
    pub fn flush(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.config.store()?;
        self.dirty = false;
        self.writes += 1;
        let (x, y) = self.position();
        debug!("Stored window position ({}, {})", x, y);
        if self.writes == 1 {
            info!("Window position persisted to {:?}", self.config.path());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowConfig;

    fn saver() -> (WindowPositionSaver, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("nnvis-window-{}", uuid::Uuid::new_v4()));
        let config = WindowConfig::load_from_dir(&dir);
        (WindowPositionSaver::new(config, Duration::from_millis(500)), dir)
    }

    #[test]
    fn test_burst_of_moves_is_written_once() {
        let (mut saver, dir) = saver();
        let start = Instant::now();
        for i in 0..50 {
            saver.record(100 + i, 200, start + Duration::from_millis(i as u64 * 10));
            assert!(!saver.flush_if_due(start + Duration::from_millis(i as u64 * 10)).unwrap());
        }
        let last = start + Duration::from_millis(490);
        assert!(saver.flush_if_due(last + Duration::from_millis(500)).unwrap());
        assert_eq!(saver.writes(), 1);

        let reloaded = WindowConfig::load_from_dir(&dir);
        assert_eq!(reloaded.get_i64("screen_x"), Some(149));
        assert_eq!(reloaded.get_i64("screen_y"), Some(200));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_flush_on_close_writes_pending_position() {
        let (mut saver, dir) = saver();
        saver.record(10, 20, Instant::now());
        assert!(saver.flush().unwrap());
        assert!(!saver.flush().unwrap());
        assert!(!saver.is_dirty());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_same_position_does_not_mark_dirty() {
        let (mut saver, _dir) = saver();
        saver.record(0, 0, Instant::now());
        assert!(!saver.is_dirty());
    }
}
