use std::mem;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::audio::AudioBackend;
use crate::error::PlaybackError;
use crate::library::Library;
use crate::queue::Queue;
use crate::session::SessionSnapshot;

use super::actor::Engine;

/// Restoring happens at most once per run.
#[derive(Debug)]
pub(crate) enum RestoreState {
    Pending(Option<SessionSnapshot>),
    Done,
}

impl RestoreState {
    /// A stored snapshot is still waiting for the library; writing now
    /// would overwrite it.
    pub(crate) fn holds_snapshot(&self) -> bool {
        matches!(self, Self::Pending(Some(_)))
    }
}

impl<B: AudioBackend> Engine<B> {
    pub(super) fn on_library(&mut self, library: Library, now: Instant) {
        let loaded = self.transport.current_track().cloned();
        self.library = library;
        debug!(tracks = self.library.len(), "library updated");

        // Keep whatever is loaded playable even if the catalog dropped it.
        if let Some(track) = loaded {
            if !self.library.contains(&track.id) {
                self.library.adopt(track);
            }
        }
        if matches!(self.error, Some(PlaybackError::LibraryUnavailable(_))) {
            self.error = None;
        }
        if !self.library.is_empty() {
            self.restore_session(now);
        }
    }

    fn restore_session(&mut self, now: Instant) {
        let RestoreState::Pending(snap) = mem::replace(&mut self.restore, RestoreState::Done)
        else {
            return;
        };
        let Some(snap) = snap else {
            return;
        };
        if self.transport.current_track().is_some() {
            debug!("playback already started; skipping session restore");
            return;
        }
        let Some(plan) = snap.resolve(&self.library) else {
            info!("nothing from the last session is in the library any more");
            self.session.discard();
            return;
        };

        let audible = if self.muted { 0.0 } else { plan.volume };
        match self
            .transport
            .restore(plan.track, plan.position, audible, now)
        {
            Ok(()) => {
                self.queue = Queue::new(plan.queue, plan.index);
                self.shuffle = plan.shuffle;
                self.repeat = plan.repeat;
                self.volume = plan.volume;
            }
            // The engine stays as it was before the snapshot was read.
            Err(e) => {
                warn!(error = %e, "could not restore the last session");
                self.session.discard();
                self.transport.unload();
                self.error = Some(e);
            }
        }
    }
}
