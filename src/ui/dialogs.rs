//! Blocking dialogs used by the options panel
//!
//! The panel only needs three things from a toolkit: pick a file, ask a
//! yes/no question, show an alert. The terminal implementations here read
//! answers from any `BufRead`, which keeps them usable in tests.

use log::warn;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Which files an open dialog offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    ImportanceFiles,
    ProcessedFiles,
}

impl FileFilter {
    pub fn description(self) -> &'static str {
        match self {
            FileFilter::ImportanceFiles => "importance files (*.json)",
            FileFilter::ProcessedFiles => "processed nn files (*.json)",
        }
    }
}

/// File pickers. `None` means the user cancelled.
pub trait FileDialog {
    fn open_file(&mut self, title: &str, filter: FileFilter) -> Option<PathBuf>;

    fn save_file(&mut self, title: &str) -> Option<PathBuf>;
}

/// Blocking confirmation and alert boxes
pub trait Prompt {
    /// Ask an OK/Cancel question; only an explicit yes returns true
    fn ask_ok_cancel(&mut self, title: &str, message: &str) -> bool;

    fn alert(&mut self, title: &str, message: &str);
}

/// Dialogs answered on a terminal
pub struct TerminalDialogs<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalDialogs<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        if write!(self.output, "{} ", question)
            .and_then(|_| self.output.flush())
            .is_err()
        {
            warn!("Could not write prompt to terminal");
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                warn!("Could not read answer: {}", e);
                None
            }
        }
    }

    fn ask_path(&mut self, question: &str) -> Option<PathBuf> {
        self.ask(question)
            .filter(|answer| !answer.is_empty())
            .map(PathBuf::from)
    }
}

impl<R: BufRead, W: Write> FileDialog for TerminalDialogs<R, W> {
    fn open_file(&mut self, title: &str, filter: FileFilter) -> Option<PathBuf> {
        self.ask_path(&format!("{} [{}] (empty to cancel):", title, filter.description()))
    }

    fn save_file(&mut self, title: &str) -> Option<PathBuf> {
        self.ask_path(&format!("{} (empty to cancel):", title))
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalDialogs<R, W> {
    fn ask_ok_cancel(&mut self, title: &str, message: &str) -> bool {
        matches!(
            self.ask(&format!("{}: {} [y/N]", title, message))
                .as_deref()
                .map(str::to_lowercase)
                .as_deref(),
            Some("y" | "yes" | "ok")
        )
    }

    fn alert(&mut self, title: &str, message: &str) {
        if writeln!(self.output, "[{}] {}", title, message).is_err() {
            warn!("{}: {}", title, message);
        }
    }
}
