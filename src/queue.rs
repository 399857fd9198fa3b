//! Play queue, repeat modes and next/previous selection.
//!
//! Everything here is pure: selection functions receive the queue, library,
//! history and preferences as arguments and return a [`Step`] for the
//! engine to carry out.

mod history;
mod model;
mod navigate;
mod shuffle;

pub use history::{HISTORY_CAP, PlayHistoryWindow};
pub use model::{Queue, RepeatMode};
pub use navigate::{Step, step_back, step_forward};
pub use shuffle::{Selection, affinity, pick_shuffled};
