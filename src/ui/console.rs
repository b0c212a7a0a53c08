//! Line-oriented front end for the options panel
//!
//! Each input line is one UI event. Parsing is kept separate from execution
//! so the grammar can be tested without a panel.

use super::options_panel::OptionsPanel;
use anyhow::{anyhow, bail, Result};
use log::debug;
use nnvis_core::{ActionState, SettingValue};
use nnvis_types::STAT_FIELDS;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::time::Instant;

pub const HELP: &str = "\
commands:
  layers                          show the layer list
  add-layer [NEURONS]             append a layer (default 9 neurons)
  set-layer INDEX NEURONS         change a layer's neuron count
  remove-layer INDEX              remove a layer
  clear-layers                    remove every layer
  generate                        generate a network from the layer list
  load [PATH]                     load an importance network
  load-processed [PATH]           load a processed network
  save [PATH]                     save the processed network
  action NAME                     stop | node-advect | node-diverge | node-noise |
                                  edge-advect | edge-diverge | edge-noise
  resample                        resample edges (stops the running action)
  smoothing on|off                toggle edge smoothing
  render NAME VALUE [stop]        change a render setting
  processing NAME VALUE           change a processing setting
  set TYPE SUBTYPE VALUE [stop]   write a <type>_<subtype> setting
  classes                         list class visibility options
  class INDEX                     select a class visibility option
  move X Y                        window moved
  stats                           show statistics
  dump                            show every setting
  quit                            ask to quit";

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Layers,
    AddLayer(u32),
    SetLayer { index: usize, neurons: u32 },
    RemoveLayer(usize),
    ClearLayers,
    Generate,
    Load(Option<PathBuf>),
    LoadProcessed(Option<PathBuf>),
    Save(Option<PathBuf>),
    Action(ActionState),
    Resample,
    Smoothing(bool),
    Render { name: String, value: serde_json::Value, stop_action: bool },
    Processing { name: String, value: serde_json::Value },
    Set { setting_type: String, sub_type: String, value: SettingValue, stop_action: bool },
    Classes,
    Class(usize),
    Move { x: i64, y: i64 },
    Stats,
    Dump,
    Quit,
}

/// Interpret a literal as the narrowest setting value: bool, int, float, then text
pub fn parse_setting_value(raw: &str) -> SettingValue {
    match raw {
        "true" => SettingValue::Bool(true),
        "false" => SettingValue::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(SettingValue::Int)
            .or_else(|_| raw.parse::<f64>().map(SettingValue::Float))
            .unwrap_or_else(|_| SettingValue::Text(raw.to_string())),
    }
}

/// Interpret a config literal as JSON, falling back to a plain string
pub fn parse_config_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn parse_number<T: std::str::FromStr>(raw: Option<&str>, what: &str) -> Result<T> {
    let raw = raw.ok_or_else(|| anyhow!("missing {}", what))?;
    raw.parse()
        .map_err(|_| anyhow!("invalid {}: {}", what, raw))
}

fn parse_stop_flag(raw: Option<&str>) -> Result<bool> {
    match raw {
        None => Ok(false),
        Some("stop") => Ok(true),
        Some(other) => bail!("unexpected argument: {}", other),
    }
}

/// Parse one line; blank lines and `#` comments yield `None`
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };

    let command = match name {
        "help" | "?" => Command::Help,
        "layers" => Command::Layers,
        "add-layer" => match words.next() {
            Some(raw) => Command::AddLayer(parse_number(Some(raw), "neuron count")?),
            None => Command::AddLayer(nnvis_core::DEFAULT_LAYER_NEURONS),
        },
        "set-layer" => Command::SetLayer {
            index: parse_number(words.next(), "layer index")?,
            neurons: parse_number(words.next(), "neuron count")?,
        },
        "remove-layer" => Command::RemoveLayer(parse_number(words.next(), "layer index")?),
        "clear-layers" => Command::ClearLayers,
        "generate" => Command::Generate,
        "load" => Command::Load(words.next().map(PathBuf::from)),
        "load-processed" => Command::LoadProcessed(words.next().map(PathBuf::from)),
        "save" => Command::Save(words.next().map(PathBuf::from)),
        "action" => {
            let raw = words.next().ok_or_else(|| anyhow!("missing action name"))?;
            Command::Action(raw.parse().map_err(|e: String| anyhow!(e))?)
        }
        "resample" => Command::Resample,
        "smoothing" => match words.next() {
            Some("on" | "1" | "true") => Command::Smoothing(true),
            Some("off" | "0" | "false") => Command::Smoothing(false),
            other => bail!("smoothing expects on|off, got {:?}", other),
        },
        "render" => {
            let name = words.next().ok_or_else(|| anyhow!("missing render setting"))?;
            let value = words.next().ok_or_else(|| anyhow!("missing value"))?;
            Command::Render {
                name: name.to_string(),
                value: parse_config_value(value),
                stop_action: parse_stop_flag(words.next())?,
            }
        }
        "processing" => {
            let name = words
                .next()
                .ok_or_else(|| anyhow!("missing processing setting"))?;
            let value = words.next().ok_or_else(|| anyhow!("missing value"))?;
            Command::Processing {
                name: name.to_string(),
                value: parse_config_value(value),
            }
        }
        "set" => {
            let setting_type = words.next().ok_or_else(|| anyhow!("missing setting type"))?;
            let sub_type = words.next().ok_or_else(|| anyhow!("missing setting subtype"))?;
            let value = words.next().ok_or_else(|| anyhow!("missing value"))?;
            Command::Set {
                setting_type: setting_type.to_string(),
                sub_type: sub_type.to_string(),
                value: parse_setting_value(value),
                stop_action: parse_stop_flag(words.next())?,
            }
        }
        "classes" => Command::Classes,
        "class" => Command::Class(parse_number(words.next(), "class option")?),
        "move" => Command::Move {
            x: parse_number(words.next(), "x coordinate")?,
            y: parse_number(words.next(), "y coordinate")?,
        },
        "stats" => Command::Stats,
        "dump" => Command::Dump,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command: {} (try `help`)", other),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected argument: {}", extra);
    }
    Ok(Some(command))
}

/// Run one command against the panel, writing feedback to `out`
pub fn execute<W: Write>(panel: &mut OptionsPanel, command: Command, out: &mut W) -> Result<()> {
    debug!("Executing {:?}", command);
    match command {
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Layers => writeln!(out, "layers: {:?}", panel.layers())?,
        Command::AddLayer(neurons) => {
            if !panel.add_layer(neurons) {
                bail!("a layer needs at least one neuron");
            }
        }
        Command::SetLayer { index, neurons } => {
            if !panel.set_layer_neurons(index, neurons) {
                bail!("cannot set layer {} to {} neurons", index, neurons);
            }
        }
        Command::RemoveLayer(index) => {
            if !panel.remove_layer(index) {
                bail!("no layer {}", index);
            }
        }
        Command::ClearLayers => panel.clear_layers(),
        Command::Generate => panel.generate()?,
        Command::Load(Some(path)) => {
            panel.load_importance_path(&path);
        }
        Command::Load(None) => {
            panel.open_importance_file();
        }
        Command::LoadProcessed(Some(path)) => {
            panel.load_processed_path(&path);
        }
        Command::LoadProcessed(None) => {
            panel.open_processed_file();
        }
        Command::Save(Some(path)) => panel.save_processed_to(&path),
        Command::Save(None) => {
            panel.save_processed_file();
        }
        Command::Action(action) => panel.select_action(action),
        Command::Resample => panel.resample_edges(),
        Command::Smoothing(enabled) => panel.set_smoothing(enabled)?,
        Command::Render {
            name,
            value,
            stop_action,
        } => panel.change_render_config(&name, value, stop_action)?,
        Command::Processing { name, value } => panel.change_processing_config(&name, value)?,
        Command::Set {
            setting_type,
            sub_type,
            value,
            stop_action,
        } => panel.change_setting(&setting_type, &sub_type, value, stop_action)?,
        Command::Classes => {
            for (index, option) in panel.class_options().iter().enumerate() {
                writeln!(out, "  {:>2}: {}", index, option)?;
            }
        }
        Command::Class(option) => {
            if !panel.show_class(option) {
                bail!("no class visibility option {}", option);
            }
        }
        Command::Move { x, y } => panel.handle_configure(x, y),
        Command::Stats => {
            for (label, value) in panel.statistics().rows() {
                writeln!(out, "  {:<13} {}", format!("{}:", label), value)?;
            }
        }
        Command::Dump => {
            let snapshot = panel.store().snapshot();
            let mut entries: Vec<_> = snapshot
                .iter()
                .filter(|(name, _)| !STAT_FIELDS.iter().any(|(key, _)| key == name))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            writeln!(out, "revision {}", snapshot.revision())?;
            for (name, value) in entries {
                writeln!(out, "  {} = {:?}", name, value)?;
            }
        }
        Command::Quit => {
            panel.on_closing();
        }
    }
    Ok(())
}

/// Line reader over the process stdin that holds no lock between lines
///
/// The console loop and the terminal dialogs both read stdin; each keeps at
/// most the current line buffered, so neither can swallow the other's input.
#[derive(Debug, Default)]
pub struct StdinLines {
    line: String,
    pos: usize,
}

impl Read for StdinLines {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for StdinLines {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.line.len() {
            self.line.clear();
            self.pos = 0;
            io::stdin().read_line(&mut self.line)?;
        }
        Ok(&self.line.as_bytes()[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.line.len());
    }
}

/// Read commands until the session closes or input ends
pub fn run<R: BufRead, W: Write>(panel: &mut OptionsPanel, mut input: R, mut out: W) -> Result<()> {
    writeln!(out, "nnvis options - type `help` for commands")?;
    let mut line = String::new();
    while !panel.store().is_closed() {
        write!(out, "> ")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        match parse_command(&line) {
            Ok(Some(command)) => {
                if let Err(e) = execute(panel, command, &mut out) {
                    writeln!(out, "error: {:#}", e)?;
                }
            }
            Ok(None) => {}
            Err(e) => writeln!(out, "error: {:#}", e)?,
        }
        panel.tick(Instant::now());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer_commands() {
        assert_eq!(parse_command("add-layer").unwrap(), Some(Command::AddLayer(9)));
        assert_eq!(parse_command("add-layer 4").unwrap(), Some(Command::AddLayer(4)));
        assert_eq!(
            parse_command("set-layer 1 16").unwrap(),
            Some(Command::SetLayer { index: 1, neurons: 16 })
        );
        assert!(parse_command("remove-layer x").is_err());
    }

    #[test]
    fn test_parse_action_and_render() {
        assert_eq!(
            parse_command("action edge-advect").unwrap(),
            Some(Command::Action(ActionState::EdgeAdvect))
        );
        assert_eq!(
            parse_command("render edge_render_mode 2 stop").unwrap(),
            Some(Command::Render {
                name: "edge_render_mode".to_string(),
                value: serde_json::json!(2),
                stop_action: true,
            })
        );
        assert!(parse_command("render edge_render_mode 2 now").is_err());
    }

    #[test]
    fn test_parse_dynamic_setting_value() {
        assert_eq!(
            parse_command("set trigger_network sample 1 stop").unwrap(),
            Some(Command::Set {
                setting_type: "trigger_network".to_string(),
                sub_type: "sample".to_string(),
                value: SettingValue::Int(1),
                stop_action: true,
            })
        );
        assert_eq!(parse_setting_value("0.25"), SettingValue::Float(0.25));
        assert_eq!(parse_setting_value("true"), SettingValue::Bool(true));
        assert_eq!(parse_setting_value("mnist"), SettingValue::Text("mnist".into()));
    }

    #[test]
    fn test_blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# setup").unwrap(), None);
    }

    #[test]
    fn test_unknown_command_and_extra_arguments_fail() {
        assert!(parse_command("explode").is_err());
        assert!(parse_command("generate now").is_err());
    }
}
