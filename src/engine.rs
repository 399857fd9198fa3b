//! The playback engine: a single actor that owns the transport, the queue,
//! the sync client and the session store, and applies commands one at a
//! time in arrival order.

mod actor;
mod cmd;
mod intents;
mod player;
mod remote;
mod restore;
mod thread;

pub use actor::{Engine, EngineOptions};
pub use cmd::{EngineCmd, Intent};
pub use player::EnginePlayer;
