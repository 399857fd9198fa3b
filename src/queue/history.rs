use std::collections::VecDeque;

use crate::library::TrackId;

pub const HISTORY_CAP: usize = 50;

/// Recently started tracks, oldest first. Entries past the cap are evicted
/// from the front.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayHistoryWindow {
    entries: VecDeque<TrackId>,
    cap: usize,
}

impl Default for PlayHistoryWindow {
    fn default() -> Self {
        Self::with_cap(HISTORY_CAP)
    }
}

impl PlayHistoryWindow {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap: cap.max(1),
        }
    }

    /// Rebuild from a persisted list, keeping the newest `HISTORY_CAP`.
    pub fn from_vec(ids: Vec<TrackId>) -> Self {
        let mut h = Self::default();
        for id in ids {
            h.push(id);
        }
        h
    }

    pub fn push(&mut self, id: TrackId) {
        self.entries.push_back(id);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    /// The newest `n` entries, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &TrackId> {
        self.entries.iter().rev().take(n)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<TrackId> {
        self.entries.iter().cloned().collect()
    }

    /// Step back through history: find the newest entry that is not
    /// `current` and passes `keep`, drop it and everything after it, and
    /// return it. History is untouched when nothing qualifies.
    pub fn rewind(
        &mut self,
        current: Option<&TrackId>,
        keep: impl Fn(&TrackId) -> bool,
    ) -> Option<TrackId> {
        let pos = self
            .entries
            .iter()
            .rposition(|id| Some(id) != current && keep(id))?;
        let id = self.entries[pos].clone();
        self.entries.truncate(pos);
        Some(id)
    }
}
