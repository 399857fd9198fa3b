//! Durable local state: the session snapshot and the independent
//! preference records next to it.

mod prefs;
mod snapshot;
mod store;

pub use prefs::{Preferences, SEARCH_HISTORY_CAP, record_search};
pub use snapshot::{RestorePlan, SessionSnapshot, SessionStore};
pub use store::{Record, StateStore};
