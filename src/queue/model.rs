use serde::{Deserialize, Serialize};

use crate::library::TrackId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    #[default]
    Off,
    /// Wrap around to the start of the queue.
    All,
    /// Replay the current track, whichever way the user skips.
    One,
}

impl RepeatMode {
    /// `off → all → one → off`
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

/// Ordered track ids plus a cursor that is either `None` or a valid index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Queue {
    entries: Vec<TrackId>,
    index: Option<usize>,
}

impl Queue {
    /// Queue positioned at `start`, clamped into range.
    pub fn new(entries: Vec<TrackId>, start: usize) -> Self {
        let index = if entries.is_empty() {
            None
        } else {
            Some(start.min(entries.len() - 1))
        };
        Self { entries, index }
    }

    /// Rebuild from persisted parts, dropping an out-of-range cursor.
    pub fn from_parts(entries: Vec<TrackId>, index: Option<usize>) -> Self {
        let index = index.filter(|&i| i < entries.len());
        Self { entries, index }
    }

    pub fn replace(&mut self, entries: Vec<TrackId>, start: usize) {
        *self = Self::new(entries, start);
    }

    pub fn entries(&self) -> &[TrackId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&TrackId> {
        self.index.and_then(|i| self.entries.get(i))
    }

    pub fn get(&self, i: usize) -> Option<&TrackId> {
        self.entries.get(i)
    }

    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.entries.iter().position(|e| e == id)
    }

    pub fn set_index(&mut self, i: usize) -> bool {
        if i < self.entries.len() {
            self.index = Some(i);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }

    /// Append; the cursor is left alone.
    pub fn push(&mut self, id: TrackId) {
        self.entries.push(id);
    }

    /// Remove the entry at `at`. Returns the removed id and whether it was
    /// the current entry.
    ///
    /// Entries after the cursor shift down; when the current entry itself
    /// goes, the cursor stays put and so lands on the entry that followed
    /// it (or becomes `None` if there was none).
    pub fn remove(&mut self, at: usize) -> Option<(TrackId, bool)> {
        if at >= self.entries.len() {
            return None;
        }
        let id = self.entries.remove(at);
        let was_current = self.index == Some(at);
        self.index = match self.index {
            Some(i) if at < i => Some(i - 1),
            Some(i) if at == i && i < self.entries.len() => Some(i),
            Some(i) if at == i => None,
            other => other,
        };
        Some((id, was_current))
    }
}
