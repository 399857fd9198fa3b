use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a track inside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A playable song as supplied by the catalog. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    /// Length in seconds, when the catalog knows it.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub cover: Option<String>,
    /// Opaque reference handed to the audio backend (a path or `file://` URL).
    pub source: String,
    #[serde(default)]
    pub genre: Option<String>,
}

impl Track {
    /// "Artist - Title", or just the title when the artist is unknown.
    pub fn label(&self) -> String {
        match self.artist.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => format!("{} - {}", a, self.title),
            _ => self.title.clone(),
        }
    }
}

/// Album record exactly as the catalog reports it: members are a
/// comma-joined list of track ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    pub track_ids: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub cover: Option<String>,
    pub tracks: Vec<TrackId>,
}

impl From<AlbumRecord> for Album {
    fn from(r: AlbumRecord) -> Self {
        Self {
            tracks: split_member_ids(&r.track_ids),
            id: r.id,
            title: r.title,
            artist: r.artist,
            cover: r.cover,
        }
    }
}

/// Split a comma-joined member list, dropping blanks.
pub fn split_member_ids(joined: &str) -> Vec<TrackId> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(TrackId::from)
        .collect()
}

/// User playlist, persisted alongside the other preference records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<TrackId>,
}
