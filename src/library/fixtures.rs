use super::model::{Track, TrackId};

pub fn track(id: &str) -> Track {
    Track {
        id: TrackId::from(id),
        title: id.to_uppercase(),
        artist: None,
        album: None,
        duration: Some(200.0),
        cover: None,
        source: format!("/music/{id}.flac"),
        genre: None,
    }
}

pub fn track_by(id: &str, artist: &str, genre: &str) -> Track {
    Track {
        artist: Some(artist.to_string()),
        genre: Some(genre.to_string()),
        ..track(id)
    }
}
