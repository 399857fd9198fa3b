use crate::audio::EqualizerSettings;
use crate::library::{Library, TrackId};
use crate::sync::SyncMessage;

/// Everything the engine thread reacts to.
#[derive(Debug)]
pub enum EngineCmd {
    Intent(Intent),
    /// Decoded by the sync reader; applied without re-broadcasting.
    Remote(SyncMessage),
    LibraryUpdated(Library),
    LibraryUnavailable(String),
    Quit { fade_out_ms: u64 },
}

impl From<Intent> for EngineCmd {
    fn from(i: Intent) -> Self {
        Self::Intent(i)
    }
}

/// A local user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Queue the whole library and start at this track.
    PlayTrack(TrackId),
    PlayList { tracks: Vec<TrackId>, start: usize },
    PlayAlbum(String),
    PlayPlaylist(String),
    TogglePlay,
    Play,
    Pause,
    Stop,
    /// Absolute position in seconds.
    Seek(f64),
    /// Relative jump in seconds.
    SeekBy(f64),
    Next,
    Prev,
    SetVolume(f32),
    AdjustVolume(f32),
    ToggleMute,
    /// `None` toggles the track that is loaded.
    ToggleLike(Option<TrackId>),
    ToggleShuffle,
    CycleRepeat,
    AddToQueue(TrackId),
    RemoveFromQueue(usize),
    CreatePlaylist { name: String },
    DeletePlaylist(String),
    AddToPlaylist { playlist: String, track: TrackId },
    RemoveFromPlaylist { playlist: String, index: usize },
    SetEqualizer(EqualizerSettings),
    DismissError,
    RecordSearch(String),
}
