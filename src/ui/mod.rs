//! User interface: the options panel handlers and their front ends

pub mod console;
pub mod dialogs;
mod options_panel;

pub use dialogs::{FileDialog, FileFilter, Prompt, TerminalDialogs};
pub use options_panel::{OptionsPanel, PanelServices};
