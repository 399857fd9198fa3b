//! Weighted "smart" shuffle.
//!
//! Candidates are every queue entry except the current one and anything
//! started within the last [`RECENT_WINDOW`] plays. Each gets a uniform
//! random score plus affinity bonuses against the current track; one of the
//! [`TOP_CANDIDATES`] best is picked at random.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::library::{Library, Track, TrackId};

use super::history::PlayHistoryWindow;
use super::model::{Queue, RepeatMode};

pub const RECENT_WINDOW: usize = 10;
pub const TOP_CANDIDATES: usize = 3;
pub const ARTIST_BONUS: f64 = 0.3;
pub const GENRE_BONUS: f64 = 0.2;
pub const LIKED_BONUS: f64 = 0.2;

/// Everything selection needs to know, passed in explicitly.
pub struct Selection<'a> {
    pub queue: &'a Queue,
    pub library: &'a Library,
    pub liked: &'a HashSet<TrackId>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

fn same_field(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.map(str::trim), b.map(str::trim)) {
        (Some(a), Some(b)) => !a.is_empty() && a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Deterministic part of a candidate's score.
pub fn affinity(current: Option<&Track>, candidate: Option<&Track>, liked: bool) -> f64 {
    let mut score = 0.0;
    if let (Some(cur), Some(cand)) = (current, candidate) {
        if same_field(cur.artist.as_deref(), cand.artist.as_deref()) {
            score += ARTIST_BONUS;
        }
        if same_field(cur.genre.as_deref(), cand.genre.as_deref()) {
            score += GENRE_BONUS;
        }
    }
    if liked {
        score += LIKED_BONUS;
    }
    score
}

/// Uniform pick over the whole queue, avoiding the current entry when
/// there is anything else.
fn uniform_fallback<R: Rng>(len: usize, current: Option<usize>, rng: &mut R) -> Option<usize> {
    if len <= 1 {
        return (len == 1).then_some(0);
    }
    let pool: Vec<usize> = (0..len).filter(|&i| Some(i) != current).collect();
    pool.choose(rng).copied()
}

/// Queue index of the next track under shuffle.
pub fn pick_shuffled<R: Rng>(
    sel: &Selection<'_>,
    history: &PlayHistoryWindow,
    rng: &mut R,
) -> Option<usize> {
    let entries = sel.queue.entries();
    let current = sel.queue.index();

    let recent: HashSet<&TrackId> = history.recent(RECENT_WINDOW).collect();
    let candidates: Vec<usize> = (0..entries.len())
        .filter(|&i| Some(i) != current && !recent.contains(&entries[i]))
        .collect();

    if candidates.is_empty() {
        return uniform_fallback(entries.len(), current, rng);
    }

    let now_playing = sel.queue.current().and_then(|id| sel.library.get(id));
    let mut scored: Vec<(f64, usize)> = candidates
        .into_iter()
        .map(|i| {
            let id = &entries[i];
            let bonus = affinity(now_playing, sel.library.get(id), sel.liked.contains(id));
            (rng.random::<f64>() + bonus, i)
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(TOP_CANDIDATES);
    scored.choose(rng).map(|&(_, i)| i)
}

/// Uniform pick used by "previous" under shuffle.
pub(super) fn pick_uniform<R: Rng>(queue: &Queue, rng: &mut R) -> Option<usize> {
    uniform_fallback(queue.len(), queue.index(), rng)
}
