use std::collections::HashSet;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::audio::EqualizerSettings;
use crate::library::{Playlist, TrackId};
use crate::queue::RepeatMode;

use super::store::{Record, StateStore};

pub const SEARCH_HISTORY_CAP: usize = 20;

/// Everything besides the session snapshot. Records load independently:
/// a missing or broken one falls back to its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub volume: Option<f32>,
    pub shuffle: Option<bool>,
    pub repeat: Option<RepeatMode>,
    pub equalizer: EqualizerSettings,
    pub liked: HashSet<TrackId>,
    pub playlists: Vec<Playlist>,
    /// Oldest first.
    pub history: Vec<TrackId>,
    /// Newest first.
    pub searches: Vec<String>,
}

impl Preferences {
    pub fn load(store: &StateStore) -> Self {
        Self {
            volume: read(store, Record::Volume),
            shuffle: read(store, Record::Shuffle),
            repeat: read(store, Record::Repeat),
            equalizer: read(store, Record::Equalizer).unwrap_or_default(),
            liked: read::<Vec<TrackId>>(store, Record::Liked)
                .unwrap_or_default()
                .into_iter()
                .collect(),
            playlists: read(store, Record::Playlists).unwrap_or_default(),
            history: read(store, Record::History).unwrap_or_default(),
            searches: read(store, Record::SearchHistory).unwrap_or_default(),
        }
    }
}

fn read<T: DeserializeOwned>(store: &StateStore, record: Record) -> Option<T> {
    match store.load(record) {
        Ok(v) => v,
        Err(e) => {
            warn!(record = record.file_name(), error = %e, "ignoring unreadable record");
            if let Err(e) = store.discard(record) {
                warn!(record = record.file_name(), error = %e, "could not remove record");
            }
            None
        }
    }
}

/// Put `query` at the front, dropping an older case-insensitive duplicate.
/// Blank queries are ignored.
pub fn record_search(searches: &mut Vec<String>, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return false;
    }
    let lowered = query.to_lowercase();
    searches.retain(|s| s.to_lowercase() != lowered);
    searches.insert(0, query.to_string());
    searches.truncate(SEARCH_HISTORY_CAP);
    true
}
