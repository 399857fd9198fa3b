use std::time::Instant;

use tracing::{debug, info};

use crate::audio::AudioBackend;
use crate::library::Track;
use crate::sync::SyncMessage;

use super::actor::Engine;

impl<B: AudioBackend> Engine<B> {
    /// Mirror a command from another client. The sync client drops every
    /// publish made while this runs, so nothing is echoed back.
    pub(super) fn apply_remote(&mut self, msg: SyncMessage, now: Instant) {
        debug!(kind = msg.kind(), "applying remote command");
        self.sync.begin_remote();
        match msg {
            SyncMessage::Play => self.play(now),
            SyncMessage::Pause => self.pause(now),
            SyncMessage::Seek { time } => self.seek_to(time),
            SyncMessage::ChangeSong { track } => self.follow_remote_track(track, now),
            SyncMessage::JoinRoom { room } => debug!(room, "ignoring join from relay"),
        }
        self.sync.end_remote();
    }

    /// Play a track announced by another client, adding it to the library
    /// and the queue when this client does not know it yet.
    fn follow_remote_track(&mut self, track: Track, now: Instant) {
        info!(track = %track.id, title = %track.title, "remote changed song");
        let id = track.id.clone();
        self.library.adopt(track);
        let at = match self.queue.position_of(&id) {
            Some(i) => i,
            None => {
                self.queue.push(id);
                self.queue.len() - 1
            }
        };
        self.queue.set_index(at);
        self.start_current(now);
    }
}
