use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::{info, warn};

use crate::audio::{Analyser, AnalyserHandle, AudioGraph, EqualizerSettings, RodioBackend, Transport};
use crate::config::{RepeatSetting, Settings, SyncSettings};
use crate::engine::{Engine, EngineCmd, EngineOptions, EnginePlayer};
use crate::library::{CatalogPoller, DirCatalog, spawn_poller};
use crate::queue::RepeatMode;
use crate::session::{SessionStore, StateStore};
use crate::sync::{Relay, SyncClient, TcpChannel};

pub fn repeat_mode(setting: RepeatSetting) -> RepeatMode {
    match setting {
        RepeatSetting::Off => RepeatMode::Off,
        RepeatSetting::All => RepeatMode::All,
        RepeatSetting::One => RepeatMode::One,
    }
}

pub fn engine_options(settings: &Settings) -> EngineOptions {
    EngineOptions {
        shuffle: settings.playback.shuffle,
        repeat: repeat_mode(settings.playback.repeat),
        previous_restart_secs: settings.playback.previous_restart_secs,
        seed: None,
    }
}

/// CLI argument first, then `library.root`, then the working directory.
pub fn music_root(arg: Option<PathBuf>, settings: &Settings) -> PathBuf {
    arg.or_else(|| settings.library.root.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Start the engine thread. The output stream, the sync connection and
/// the session store are all created on that thread.
pub fn start_engine(settings: &Settings, data_dir: PathBuf) -> (EnginePlayer, AnalyserHandle) {
    let audio = settings.audio.clone();
    let sync = settings.sync.clone();
    let options = engine_options(settings);
    let debounce = Duration::from_millis(settings.storage.position_save_interval_ms);
    let analyser = Analyser::handle();
    let engine_analyser = analyser.clone();

    let player = EnginePlayer::start(Duration::from_millis(audio.frame_ms), move |tx| {
        let transport = Transport::new(
            RodioBackend::new(),
            AudioGraph::new(engine_analyser, EqualizerSettings::default()),
            audio.volume,
            Duration::from_millis(audio.fade_ms),
        );
        let session = SessionStore::new(StateStore::new(data_dir), debounce);
        Engine::new(transport, connect_sync(&sync, tx), session, options)
    });
    (player, analyser)
}

fn connect_sync(settings: &SyncSettings, engine: &Sender<EngineCmd>) -> SyncClient {
    if !settings.enabled {
        return SyncClient::disconnected();
    }
    match TcpChannel::connect(&settings.server, engine.clone()) {
        Ok(channel) => {
            let mut client = SyncClient::new(Box::new(channel));
            if let Err(e) = client.join(&settings.room) {
                warn!(room = %settings.room, error = %e, "could not join sync room");
            }
            client
        }
        Err(e) => {
            warn!(server = %settings.server, error = %e, "sync relay unreachable; playing locally");
            SyncClient::disconnected()
        }
    }
}

pub fn start_poller(settings: &Settings, root: PathBuf, engine: Sender<EngineCmd>) -> CatalogPoller {
    info!(root = %root.display(), "watching music directory");
    let catalog = DirCatalog::new(root, settings.library.clone());
    spawn_poller(
        catalog,
        Duration::from_secs(settings.library.poll_interval_secs),
        settings.library.list_limit,
        engine,
    )
}

pub fn run_relay(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    Relay::bind(addr)?.serve()?;
    Ok(())
}
