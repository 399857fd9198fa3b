use std::collections::HashMap;

use super::model::{Album, Track, TrackId};

/// In-memory snapshot of the catalog.
///
/// Replaced wholesale on every successful poll; the newest fetch wins.
#[derive(Debug, Clone, Default)]
pub struct Library {
    tracks: Vec<Track>,
    by_id: HashMap<TrackId, usize>,
    albums: Vec<Album>,
}

impl Library {
    pub fn new(tracks: Vec<Track>, albums: Vec<Album>) -> Self {
        let mut lib = Self {
            tracks: Vec::with_capacity(tracks.len()),
            by_id: HashMap::with_capacity(tracks.len()),
            albums,
        };
        for t in tracks {
            lib.adopt(t);
        }
        lib
    }

    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.by_id.get(id).map(|&i| &self.tracks[i])
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn album(&self, id: &str) -> Option<&Album> {
        self.albums.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Insert a track the catalog did not supply (e.g. one announced by a
    /// remote client). A later catalog refresh drops it again.
    ///
    /// Duplicate ids keep the first copy.
    pub fn adopt(&mut self, track: Track) {
        if self.by_id.contains_key(&track.id) {
            return;
        }
        self.by_id.insert(track.id.clone(), self.tracks.len());
        self.tracks.push(track);
    }
}
