use rand::Rng;

use super::history::PlayHistoryWindow;
use super::model::RepeatMode;
use super::shuffle::{Selection, pick_shuffled, pick_uniform};

/// What the engine should do after a skip or the end of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Start the entry at this queue index.
    Play(usize),
    /// Replay the current entry from the start.
    Restart,
    /// Stop at position 0, keeping the current track.
    Halt,
}

/// Skip forward or handle a natural end of track. `None` means the queue
/// is empty.
pub fn step_forward<R: Rng>(
    sel: &Selection<'_>,
    history: &PlayHistoryWindow,
    rng: &mut R,
) -> Option<Step> {
    let len = sel.queue.len();
    if len == 0 {
        return None;
    }
    let Some(i) = sel.queue.index() else {
        return Some(Step::Play(0));
    };
    if sel.repeat == RepeatMode::One {
        return Some(Step::Restart);
    }
    if sel.shuffle {
        return pick_shuffled(sel, history, rng).map(Step::Play);
    }
    if i + 1 < len {
        return Some(Step::Play(i + 1));
    }
    match sel.repeat {
        RepeatMode::All => Some(Step::Play(0)),
        _ => Some(Step::Halt),
    }
}

/// Skip backwards.
///
/// Within `restart_after` seconds of the track start, restart it. Otherwise
/// go to the newest history entry that is still queued, then fall back to a
/// random entry under shuffle or the previous index (wrapping).
pub fn step_back<R: Rng>(
    sel: &Selection<'_>,
    history: &mut PlayHistoryWindow,
    position: f64,
    restart_after: f64,
    rng: &mut R,
) -> Option<Step> {
    let len = sel.queue.len();
    if len == 0 {
        return None;
    }
    let Some(i) = sel.queue.index() else {
        return Some(Step::Play(len - 1));
    };
    if sel.repeat == RepeatMode::One || position <= restart_after {
        return Some(Step::Restart);
    }

    let current = sel.queue.current();
    if let Some(id) = history.rewind(current, |id| sel.queue.position_of(id).is_some()) {
        return sel.queue.position_of(&id).map(Step::Play);
    }

    if sel.shuffle {
        return pick_uniform(sel.queue, rng).map(Step::Play);
    }
    Some(Step::Play((i + len - 1) % len))
}
