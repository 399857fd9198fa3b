use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::audio::{
    AudioBackend, PlaybackHandle, PlaybackState, QueueHandle, QueueView, Transport,
    TransportEvent,
};
use crate::error::PlaybackError;
use crate::library::{Library, Playlist, TrackId};
use crate::queue::{PlayHistoryWindow, Queue, RepeatMode, Selection, Step, step_forward};
use crate::session::{Preferences, Record, SessionSnapshot, SessionStore};
use crate::sync::{SyncClient, SyncMessage};

use super::cmd::EngineCmd;
use super::restore::RestoreState;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Used when no preference record exists yet.
    pub shuffle: bool,
    pub repeat: RepeatMode,
    /// "Previous" restarts the track once it has played this long.
    pub previous_restart_secs: f64,
    /// Fixed seed for the shuffle RNG; random when unset.
    pub seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: RepeatMode::Off,
            previous_restart_secs: 3.0,
            seed: None,
        }
    }
}

pub struct Engine<B: AudioBackend> {
    pub(super) transport: Transport<B>,
    pub(super) library: Library,
    pub(super) queue: Queue,
    pub(super) history: PlayHistoryWindow,
    pub(super) liked: HashSet<TrackId>,
    pub(super) playlists: Vec<Playlist>,
    pub(super) searches: Vec<String>,
    pub(super) shuffle: bool,
    pub(super) repeat: RepeatMode,
    /// The user's volume; the transport runs at 0 while muted.
    pub(super) volume: f32,
    pub(super) muted: bool,
    pub(super) error: Option<PlaybackError>,
    pub(super) sync: SyncClient,
    pub(super) session: SessionStore,
    pub(super) restore: RestoreState,
    pub(super) previous_restart_secs: f64,
    pub(super) rng: StdRng,
    playback: PlaybackHandle,
    queue_view: QueueHandle,
}

impl<B: AudioBackend> Engine<B> {
    /// Preference records override `options`; the session snapshot is held
    /// until the first non-empty library arrives.
    pub fn new(
        mut transport: Transport<B>,
        sync: SyncClient,
        mut session: SessionStore,
        options: EngineOptions,
    ) -> Self {
        let prefs = Preferences::load(session.state());
        let (restore, error) = match session.load_snapshot() {
            Ok(snap) => (RestoreState::Pending(snap), None),
            Err(e) => (RestoreState::Pending(None), Some(e)),
        };

        let volume = prefs.volume.unwrap_or(transport.volume()).clamp(0.0, 1.0);
        transport.set_volume(volume);
        transport.apply_equalizer(prefs.equalizer);

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let engine = Self {
            transport,
            library: Library::default(),
            queue: Queue::default(),
            history: PlayHistoryWindow::from_vec(prefs.history),
            liked: prefs.liked,
            playlists: prefs.playlists,
            searches: prefs.searches,
            shuffle: prefs.shuffle.unwrap_or(options.shuffle),
            repeat: prefs.repeat.unwrap_or(options.repeat),
            volume,
            muted: false,
            error,
            sync,
            session,
            restore,
            previous_restart_secs: options.previous_restart_secs,
            rng,
            playback: Arc::new(Mutex::new(PlaybackState::default())),
            queue_view: Arc::new(Mutex::new(QueueView::default())),
        };
        engine.publish();
        engine
    }

    /// Publish into handles created elsewhere (before the engine thread
    /// existed).
    pub fn with_handles(mut self, playback: PlaybackHandle, queue: QueueHandle) -> Self {
        self.playback = playback;
        self.queue_view = queue;
        self.publish();
        self
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        Arc::clone(&self.playback)
    }

    pub fn queue_handle(&self) -> QueueHandle {
        Arc::clone(&self.queue_view)
    }

    pub fn transport(&self) -> &Transport<B> {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut Transport<B> {
        &mut self.transport
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn error(&self) -> Option<&PlaybackError> {
        self.error.as_ref()
    }

    pub fn liked(&self) -> &HashSet<TrackId> {
        &self.liked
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn searches(&self) -> &[String] {
        &self.searches
    }

    pub fn sync(&self) -> &SyncClient {
        &self.sync
    }

    /// Progress ticks are only needed while something audible changes.
    pub fn needs_frames(&self) -> bool {
        self.transport.needs_frames()
    }

    pub fn handle(&mut self, cmd: EngineCmd, now: Instant) {
        match cmd {
            EngineCmd::Intent(intent) => self.apply_intent(intent, now),
            EngineCmd::Remote(msg) => self.apply_remote(msg, now),
            EngineCmd::LibraryUpdated(library) => self.on_library(library, now),
            EngineCmd::LibraryUnavailable(reason) => {
                self.error = Some(PlaybackError::LibraryUnavailable(reason));
            }
            EngineCmd::Quit { fade_out_ms } => {
                self.shutdown(Duration::from_millis(fade_out_ms), now);
                return;
            }
        }
        self.publish();
        self.save_session(now);
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(TransportEvent::Ended) = self.transport.tick(now) {
            self.on_ended(now);
        }
        self.publish();
        self.save_session(now);
    }

    /// Save everything and fade out. Blocks for the length of `fade`.
    pub fn shutdown(&mut self, fade: Duration, now: Instant) {
        self.save_now(now);
        self.transport.shutdown(fade);
        self.publish();
        info!("engine stopped");
    }

    fn on_ended(&mut self, now: Instant) {
        let sel = Selection {
            queue: &self.queue,
            library: &self.library,
            liked: &self.liked,
            shuffle: self.shuffle,
            repeat: self.repeat,
        };
        match step_forward(&sel, &self.history, &mut self.rng) {
            Some(step) => self.apply_step(step, now),
            None => debug!("track ended with an empty queue"),
        }
    }

    pub(super) fn apply_step(&mut self, step: Step, now: Instant) {
        match step {
            Step::Play(i) => {
                self.queue.set_index(i);
                self.start_current(now);
            }
            Step::Restart => self.restart_current(now),
            Step::Halt => {
                if let Err(e) = self.transport.rewind_and_halt() {
                    self.error = Some(e);
                }
                self.sync.publish(SyncMessage::Pause);
                self.sync.publish(SyncMessage::Seek { time: 0.0 });
            }
        }
    }

    fn restart_current(&mut self, now: Instant) {
        let loaded = self.transport.current_track().map(|t| &t.id);
        if loaded.is_none() || loaded != self.queue.current() {
            self.start_current(now);
            return;
        }
        match self.transport.restart(now) {
            Ok(()) => {
                self.sync.publish(SyncMessage::Seek { time: 0.0 });
                self.sync.publish(SyncMessage::Play);
            }
            Err(e) => self.error = Some(e),
        }
    }

    /// Load and play the entry under the cursor.
    pub(super) fn start_current(&mut self, now: Instant) {
        let Some(id) = self.queue.current().cloned() else {
            return;
        };
        let Some(track) = self.library.get(&id).cloned() else {
            self.transport.stop(now);
            self.error = Some(PlaybackError::load(id.as_str(), "not in library"));
            return;
        };
        match self.transport.load_and_play(track.clone(), now) {
            Ok(()) => {
                self.clear_transient_error();
                self.history.push(id);
                self.session.state().persist(Record::History, &self.history.to_vec());
                self.sync.publish(SyncMessage::ChangeSong { track });
            }
            Err(e) => self.error = Some(e),
        }
    }

    pub(super) fn clear_transient_error(&mut self) {
        if matches!(
            self.error,
            Some(PlaybackError::Load { .. } | PlaybackError::Play { .. })
        ) {
            self.error = None;
        }
    }

    /// `None` while there is nothing worth restoring.
    pub(super) fn snapshot(&self) -> Option<SessionSnapshot> {
        let current = self.transport.current_track().map(|t| t.id.clone());
        if self.queue.is_empty() && current.is_none() {
            return None;
        }
        Some(SessionSnapshot {
            current_track: current,
            position: self.transport.position(),
            queue: self.queue.entries().to_vec(),
            index: self.queue.index(),
            volume: self.volume,
            shuffle: self.shuffle,
            repeat: self.repeat,
        })
    }

    fn save_session(&mut self, now: Instant) {
        if self.restore.holds_snapshot() {
            return;
        }
        if let Some(snap) = self.snapshot() {
            self.session.record(snap, now);
        }
        // No further ticks will come to flush a debounced position.
        if !self.needs_frames() && self.session.has_pending() {
            self.session.flush(now);
        }
    }

    /// Write the current state, bypassing the position debounce.
    pub(super) fn save_now(&mut self, now: Instant) {
        if self.restore.holds_snapshot() {
            return;
        }
        if let Some(snap) = self.snapshot() {
            self.session.record(snap, now);
        }
        self.session.flush(now);
    }

    pub(super) fn publish(&self) {
        if let Ok(mut s) = self.playback.lock() {
            *s = PlaybackState {
                current: self.transport.current_track().cloned(),
                transport: self.transport.state(),
                playing: self.transport.is_playing(),
                position: self.transport.position(),
                duration: self.transport.duration(),
                volume: self.volume,
                muted: self.muted,
                shuffle: self.shuffle,
                repeat: self.repeat,
                error: self.error.clone(),
            };
        }
        if let Ok(mut q) = self.queue_view.lock() {
            q.tracks.clear();
            q.tracks.extend_from_slice(self.queue.entries());
            q.index = self.queue.index();
            q.history = self.history.to_vec();
        }
    }
}
