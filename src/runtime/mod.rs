use std::env;
use std::path::PathBuf;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{info, warn};

mod event_loop;
mod keys;
mod logging;
mod settings;
mod startup;


const DEFAULT_RELAY_ADDR: &str = "0.0.0.0:7878";

/// `chorus [MUSIC_DIR]` plays; `chorus relay [ADDR]` runs the room relay;
/// `chorus config` prints the effective settings.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    match args.next() {
        Some(cmd) if cmd == "relay" => {
            logging::init_stderr();
            let addr = args.next().unwrap_or_else(|| DEFAULT_RELAY_ADDR.to_string());
            startup::run_relay(&addr)
        }
        Some(cmd) if cmd == "config" => {
            let (settings, problem) = settings::load_settings();
            if let Some(msg) = problem {
                eprintln!("chorus: {msg}");
            }
            print!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
        root => play(root.map(PathBuf::from)),
    }
}

fn play(root: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let (settings, problem) = settings::load_settings();
    let data_dir = settings
        .data_dir()
        .ok_or("cannot determine a data directory; set storage.data_dir")?;

    logging::init_file(&data_dir);
    if let Some(msg) = problem {
        warn!("{msg}");
    }
    info!(data_dir = %data_dir.display(), "starting");

    let root = startup::music_root(root, &settings);
    let (player, analyser) = startup::start_engine(&settings, data_dir);
    let poller = startup::start_poller(&settings, root, player.sender());

    enable_raw_mode()?;
    let run_result = event_loop::run(&settings, &player, &poller, &analyser);
    disable_raw_mode()?;
    println!();

    poller.stop();
    run_result
}
