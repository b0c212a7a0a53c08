use clap::Parser;
use log::{error, info, warn};
use nnvis::config::ConfigSet;
use nnvis::core::{FramePoller, HeadlessEngine};
use nnvis::data::JsonNetworkLoader;
use nnvis::ui::console::{self, StdinLines};
use nnvis::ui::{OptionsPanel, PanelServices, TerminalDialogs};
use nnvis_core::{global_store, init_global_store, SettingsStore, FRAME_INTERVAL};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;

/// nnvis - options panel for the neural-network visualizer
#[derive(Parser, Debug, Clone)]
#[command(name = "nnvis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,

    /// Initial layer list, e.g. --layers 4,9,9
    #[arg(short = 'l', long = "layers", value_name = "N,N,...", value_delimiter = ',')]
    layers: Option<Vec<u32>>,

    /// Importance network to load at startup
    #[arg(short = 'n', long = "network", value_name = "FILE")]
    network: Option<PathBuf>,

    /// Processed network to load at startup
    #[arg(short = 'p', long = "processed", value_name = "FILE", conflicts_with = "network")]
    processed: Option<PathBuf>,

    /// Directory holding the persisted configs (defaults to the user config dir)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting nnvis v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(SettingsStore::new());
    init_global_store(Arc::clone(&store));

    let configs = match cli.config_dir {
        Some(ref dir) => ConfigSet::load_from_dir(dir),
        None => match ConfigSet::load() {
            Ok(configs) => configs,
            Err(e) => {
                warn!("No config directory available, using working directory: {:#}", e);
                ConfigSet::load_from_dir(&std::env::current_dir()?)
            }
        },
    };

    let services = PanelServices {
        loader: Box::new(JsonNetworkLoader),
        files: Box::new(TerminalDialogs::new(StdinLines::default(), stdout())),
        prompt: Box::new(TerminalDialogs::new(StdinLines::default(), stdout())),
    };
    let mut panel = OptionsPanel::new(Arc::clone(&store), configs, services);

    // Spawn tokio runtime for the frame loop
    let frame_thread = std::thread::spawn(|| {
        let Some(frame_store) = global_store().cloned() else {
            error!("Settings store not initialized, frame loop not started");
            return;
        };
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create tokio runtime: {}", e);
                return;
            }
        };
        rt.block_on(async {
            let poller = FramePoller::new(frame_store, Box::new(HeadlessEngine::new()));
            poller.run(FRAME_INTERVAL).await;
        });
    });

    if let Err(e) = panel.start(cli.layers.clone()) {
        error!("Could not generate the initial network: {}", e);
    }
    if let Some(ref path) = cli.network {
        panel.load_importance_path(path);
    } else if let Some(ref path) = cli.processed {
        panel.load_processed_path(path);
    }

    let result = console::run(&mut panel, StdinLines::default(), stdout());
    panel.shutdown();

    if frame_thread.join().is_err() {
        error!("Frame loop panicked");
    }
    info!("nnvis stopped");
    result
}
