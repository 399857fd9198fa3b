use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/chorus/config.toml` or `~/.config/chorus/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CHORUS__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub controls: ControlsSettings,
    pub library: LibrarySettings,
    pub sync: SyncSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Fade applied when a track starts and when it is replaced (milliseconds).
    /// Set to 0 to switch instantly.
    pub fade_ms: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Interval of the progress tick while something is audible (milliseconds).
    pub frame_ms: u64,
    /// Volume used when nothing has been persisted yet (0.0 - 1.0).
    pub volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            fade_ms: 500,
            quit_fade_out_ms: 500,
            frame_ms: 50,
            volume: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled when no preference is stored.
    pub shuffle: bool,
    /// Repeat mode used when no preference is stored.
    pub repeat: RepeatSetting,
    /// "Previous" restarts the current track within this many seconds of its start.
    pub previous_restart_secs: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: RepeatSetting::Off,
            previous_restart_secs: 3.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatSetting {
    #[serde(alias = "none", alias = "no-repeat", alias = "no_repeat")]
    Off,
    #[serde(alias = "repeat-all", alias = "repeat_all", alias = "loop-all")]
    All,
    #[serde(alias = "repeat-one", alias = "repeat_one", alias = "loop-one")]
    One,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to seek when pressing `H` / `L`.
    pub seek_seconds: u64,
    /// Volume change per `+` / `-` press.
    pub volume_step: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            seek_seconds: 5,
            volume_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Music directory. Falls back to the first CLI argument, then the
    /// current directory.
    pub root: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
    /// Seconds between catalog polls.
    pub poll_interval_secs: u64,
    /// Maximum number of tracks requested per poll; 0 means everything.
    pub list_limit: usize,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: None,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
            poll_interval_secs: 60,
            list_limit: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub enabled: bool,
    /// Relay address, `host:port`.
    pub server: String,
    pub room: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            server: "127.0.0.1:7878".to_string(),
            room: "lobby".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Where session and preference records live. Defaults to
    /// `$XDG_DATA_HOME/chorus` or `~/.local/share/chorus`.
    pub data_dir: Option<PathBuf>,
    /// Minimum gap between two session writes caused only by the position
    /// moving (milliseconds).
    pub position_save_interval_ms: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            position_save_interval_ms: 2000,
        }
    }
}
