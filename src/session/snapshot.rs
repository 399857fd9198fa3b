use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PlaybackError, StoreError};
use crate::library::{Library, Track, TrackId};
use crate::queue::RepeatMode;

use super::store::{Record, StateStore};

/// What the engine writes after every state change so a restart can pick
/// up where the last run stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub current_track: Option<TrackId>,
    /// Seconds into `current_track`.
    pub position: f64,
    pub queue: Vec<TrackId>,
    pub index: Option<usize>,
    pub volume: f32,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

/// A snapshot checked against the current library.
#[derive(Debug, Clone, PartialEq)]
pub struct RestorePlan {
    pub queue: Vec<TrackId>,
    pub index: usize,
    pub track: Track,
    pub position: f64,
    pub volume: f32,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl SessionSnapshot {
    fn same_apart_from_position(&self, other: &Self) -> bool {
        self.current_track == other.current_track
            && self.queue == other.queue
            && self.index == other.index
            && self.volume == other.volume
            && self.shuffle == other.shuffle
            && self.repeat == other.repeat
    }

    /// Drop queue entries the library no longer knows and clamp the cursor.
    ///
    /// When the entry the cursor pointed at is gone, the cursor lands on the
    /// entry that followed it and the saved position is discarded.
    /// Returns `None` when nothing playable survives.
    pub fn resolve(&self, library: &Library) -> Option<RestorePlan> {
        let queue: Vec<TrackId> = self
            .queue
            .iter()
            .filter(|id| library.contains(id))
            .cloned()
            .collect();
        if queue.is_empty() {
            return None;
        }

        let stored = self.index.filter(|&i| i < self.queue.len());
        let (index, same_track) = match stored {
            Some(i) => {
                let kept_before = self.queue[..i]
                    .iter()
                    .filter(|id| library.contains(id))
                    .count();
                (
                    kept_before.min(queue.len() - 1),
                    library.contains(&self.queue[i]),
                )
            }
            None => match self
                .current_track
                .as_ref()
                .and_then(|id| queue.iter().position(|q| q == id))
            {
                Some(p) => (p, true),
                None => (0, false),
            },
        };

        let track = library.get(&queue[index])?.clone();
        let position = if same_track && self.position.is_finite() {
            self.position.max(0.0)
        } else {
            0.0
        };
        let volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            1.0
        };

        Some(RestorePlan {
            queue,
            index,
            track,
            position,
            volume,
            shuffle: self.shuffle,
            repeat: self.repeat,
        })
    }
}

/// Writes the session record, holding back writes that only move the
/// position until `debounce` has passed since the last write.
pub struct SessionStore {
    store: StateStore,
    debounce: Duration,
    written: Option<SessionSnapshot>,
    written_at: Option<Instant>,
    pending: Option<SessionSnapshot>,
}

impl SessionStore {
    pub fn new(store: StateStore, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            written: None,
            written_at: None,
            pending: None,
        }
    }

    pub fn state(&self) -> &StateStore {
        &self.store
    }

    /// A snapshot that fails to parse is deleted and reported as
    /// [`PlaybackError::SessionCorrupt`]; the other records are untouched.
    pub fn load_snapshot(&mut self) -> Result<Option<SessionSnapshot>, PlaybackError> {
        match self.store.load::<SessionSnapshot>(Record::Session) {
            Ok(snap) => {
                self.written = snap.clone();
                Ok(snap)
            }
            Err(e @ StoreError::Malformed { .. }) => {
                warn!(error = %e, "discarding unreadable session snapshot");
                self.discard();
                Err(PlaybackError::SessionCorrupt(e.to_string()))
            }
            Err(e) => {
                warn!(error = %e, "could not read session snapshot");
                Ok(None)
            }
        }
    }

    /// Returns true when the snapshot hit the disk.
    pub fn record(&mut self, snap: SessionSnapshot, now: Instant) -> bool {
        if self.written.as_ref() == Some(&snap) {
            self.pending = None;
            return false;
        }
        let position_only = self
            .written
            .as_ref()
            .is_some_and(|w| w.same_apart_from_position(&snap));
        let recent = self
            .written_at
            .is_some_and(|t| now.saturating_duration_since(t) < self.debounce);
        if position_only && recent {
            self.pending = Some(snap);
            return false;
        }
        self.write(snap, now)
    }

    /// Write a held-back snapshot right away.
    pub fn flush(&mut self, now: Instant) {
        if let Some(snap) = self.pending.take() {
            self.write(snap, now);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn discard(&mut self) {
        if let Err(e) = self.store.discard(Record::Session) {
            warn!(error = %e, "could not remove session snapshot");
        }
        self.written = None;
        self.written_at = None;
        self.pending = None;
    }

    fn write(&mut self, snap: SessionSnapshot, now: Instant) -> bool {
        self.pending = None;
        match self.store.save(Record::Session, &snap) {
            Ok(()) => {
                debug!(position = snap.position, "session saved");
                self.written = Some(snap);
                self.written_at = Some(now);
                true
            }
            Err(e) => {
                warn!(error = %e, "could not save session snapshot");
                false
            }
        }
    }
}
