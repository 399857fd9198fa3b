use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::StoreError;

/// One JSON file per record, so a damaged file never takes the others
/// down with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Session,
    Volume,
    Shuffle,
    Repeat,
    Equalizer,
    Liked,
    Playlists,
    History,
    SearchHistory,
}

impl Record {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Session => "session.json",
            Self::Volume => "volume.json",
            Self::Shuffle => "shuffle.json",
            Self::Repeat => "repeat.json",
            Self::Equalizer => "equalizer.json",
            Self::Liked => "liked.json",
            Self::Playlists => "playlists.json",
            Self::History => "history.json",
            Self::SearchHistory => "search_history.json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, record: Record) -> PathBuf {
        self.dir.join(record.file_name())
    }

    /// `Ok(None)` when the record was never written.
    pub fn load<T: DeserializeOwned>(&self, record: Record) -> Result<Option<T>, StoreError> {
        let path = self.path(record);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Malformed { path, source })
    }

    /// Write to a temporary file next to the record, then rename over it.
    pub fn save<T: Serialize>(&self, record: Record, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path(record);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    /// [`save`](Self::save), logging instead of failing.
    pub fn persist<T: Serialize>(&self, record: Record, value: &T) {
        if let Err(e) = self.save(record, value) {
            warn!(record = record.file_name(), error = %e, "could not persist record");
        }
    }

    pub fn discard(&self, record: Record) -> Result<(), StoreError> {
        let path = self.path(record);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}
