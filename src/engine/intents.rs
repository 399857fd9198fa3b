use std::time::Instant;

use tracing::{debug, warn};

use crate::audio::{AudioBackend, EqualizerSettings, TransportState};
use crate::library::{Playlist, TrackId};
use crate::queue::{Selection, step_back, step_forward};
use crate::session::{Record, record_search};
use crate::sync::SyncMessage;

use super::actor::Engine;
use super::cmd::Intent;

impl<B: AudioBackend> Engine<B> {
    pub(super) fn apply_intent(&mut self, intent: Intent, now: Instant) {
        debug!(?intent, "intent");
        match intent {
            Intent::PlayTrack(id) => self.play_track(id, now),
            Intent::PlayList { tracks, start } => self.play_list(tracks, start, now),
            Intent::PlayAlbum(id) => match self.library.album(&id) {
                Some(album) => {
                    let tracks = album.tracks.clone();
                    self.play_list(tracks, 0, now);
                }
                None => warn!(album = %id, "unknown album"),
            },
            Intent::PlayPlaylist(id) => match self.playlists.iter().find(|p| p.id == id) {
                Some(p) => {
                    let tracks = p.tracks.clone();
                    self.play_list(tracks, 0, now);
                }
                None => warn!(playlist = %id, "unknown playlist"),
            },
            Intent::TogglePlay => {
                if self.transport.is_playing() {
                    self.pause(now);
                } else {
                    self.play(now);
                }
            }
            Intent::Play => self.play(now),
            Intent::Pause => self.pause(now),
            Intent::Stop => {
                self.transport.stop(now);
                self.sync.publish(SyncMessage::Pause);
            }
            Intent::Seek(secs) => self.seek_to(secs),
            Intent::SeekBy(delta) => {
                let target = self.transport.position() + delta;
                self.seek_to(target);
            }
            Intent::Next => self.skip_forward(now),
            Intent::Prev => self.skip_back(now),
            Intent::SetVolume(v) => self.set_volume(v),
            Intent::AdjustVolume(delta) => self.set_volume(self.volume + delta),
            Intent::ToggleMute => {
                self.muted = !self.muted;
                let audible = if self.muted { 0.0 } else { self.volume };
                self.transport.set_volume(audible);
            }
            Intent::ToggleLike(id) => self.toggle_like(id),
            Intent::ToggleShuffle => {
                self.shuffle = !self.shuffle;
                self.session.state().persist(Record::Shuffle, &self.shuffle);
            }
            Intent::CycleRepeat => {
                self.repeat = self.repeat.cycle();
                self.session.state().persist(Record::Repeat, &self.repeat);
            }
            Intent::AddToQueue(id) => self.queue.push(id),
            Intent::RemoveFromQueue(at) => self.remove_from_queue(at, now),
            Intent::CreatePlaylist { name } => self.create_playlist(name),
            Intent::DeletePlaylist(id) => {
                let before = self.playlists.len();
                self.playlists.retain(|p| p.id != id);
                if self.playlists.len() != before {
                    self.persist_playlists();
                }
            }
            Intent::AddToPlaylist { playlist, track } => {
                if let Some(p) = self.playlists.iter_mut().find(|p| p.id == playlist) {
                    p.tracks.push(track);
                    self.persist_playlists();
                }
            }
            Intent::RemoveFromPlaylist { playlist, index } => {
                let removed = self
                    .playlists
                    .iter_mut()
                    .find(|p| p.id == playlist)
                    .filter(|p| index < p.tracks.len())
                    .map(|p| p.tracks.remove(index));
                if removed.is_some() {
                    self.persist_playlists();
                }
            }
            Intent::SetEqualizer(settings) => self.set_equalizer(settings),
            Intent::DismissError => self.error = None,
            Intent::RecordSearch(query) => {
                if record_search(&mut self.searches, &query) {
                    self.session
                        .state()
                        .persist(Record::SearchHistory, &self.searches);
                }
            }
        }
    }

    fn play_track(&mut self, id: TrackId, now: Instant) {
        let ids: Vec<TrackId> = self.library.tracks().iter().map(|t| t.id.clone()).collect();
        let Some(start) = ids.iter().position(|t| *t == id) else {
            warn!(track = %id, "cannot play a track the library does not have");
            return;
        };
        self.play_list(ids, start, now);
    }

    fn play_list(&mut self, tracks: Vec<TrackId>, start: usize, now: Instant) {
        if tracks.is_empty() {
            debug!("ignoring request to play an empty list");
            return;
        }
        self.queue.replace(tracks, start);
        self.start_current(now);
    }

    /// Resume what is loaded, or start the entry under the cursor.
    pub(super) fn play(&mut self, now: Instant) {
        match self.transport.state() {
            TransportState::Playing | TransportState::Loading => {}
            TransportState::Paused | TransportState::Stopped => match self.transport.resume() {
                Ok(true) => {
                    self.clear_transient_error();
                    self.sync.publish(SyncMessage::Play);
                }
                Ok(false) => {}
                Err(e) => self.error = Some(e),
            },
            TransportState::Idle | TransportState::Ended => {
                if self.queue.index().is_none() && !self.queue.is_empty() {
                    self.queue.set_index(0);
                }
                self.start_current(now);
            }
        }
    }

    pub(super) fn pause(&mut self, now: Instant) {
        if self.transport.pause() {
            self.sync.publish(SyncMessage::Pause);
            self.save_now(now);
        }
    }

    pub(super) fn seek_to(&mut self, secs: f64) {
        if !secs.is_finite() {
            return;
        }
        match self.transport.seek(secs) {
            Ok(Some(at)) => {
                self.sync.publish(SyncMessage::Seek { time: at });
            }
            Ok(None) => debug!("seek ignored; nothing loaded"),
            Err(e) => self.error = Some(e),
        }
    }

    fn skip_forward(&mut self, now: Instant) {
        let sel = Selection {
            queue: &self.queue,
            library: &self.library,
            liked: &self.liked,
            shuffle: self.shuffle,
            repeat: self.repeat,
        };
        if let Some(step) = step_forward(&sel, &self.history, &mut self.rng) {
            self.apply_step(step, now);
        }
    }

    fn skip_back(&mut self, now: Instant) {
        let position = self.transport.position();
        let sel = Selection {
            queue: &self.queue,
            library: &self.library,
            liked: &self.liked,
            shuffle: self.shuffle,
            repeat: self.repeat,
        };
        let step = step_back(
            &sel,
            &mut self.history,
            position,
            self.previous_restart_secs,
            &mut self.rng,
        );
        if let Some(step) = step {
            self.apply_step(step, now);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.muted = false;
        self.transport.set_volume(self.volume);
        self.session.state().persist(Record::Volume, &self.volume);
    }

    fn toggle_like(&mut self, id: Option<TrackId>) {
        let Some(id) = id.or_else(|| self.transport.current_track().map(|t| t.id.clone()))
        else {
            return;
        };
        if !self.liked.remove(&id) {
            self.liked.insert(id);
        }
        let mut ids: Vec<&TrackId> = self.liked.iter().collect();
        ids.sort();
        self.session.state().persist(Record::Liked, &ids);
    }

    /// Removing the entry that is playing moves on to the one that slid
    /// into its place; removing a paused or parked current entry unloads it.
    fn remove_from_queue(&mut self, at: usize, now: Instant) {
        let was_playing = self.transport.is_playing();
        let Some((id, was_current)) = self.queue.remove(at) else {
            return;
        };
        debug!(track = %id, at, "removed from queue");
        if !was_current {
            return;
        }
        if was_playing && self.queue.index().is_some() {
            self.start_current(now);
        } else {
            self.transport.stop(now);
        }
    }

    fn create_playlist(&mut self, name: String) {
        let name = name.trim().to_string();
        if name.is_empty() {
            return;
        }
        let next = self
            .playlists
            .iter()
            .filter_map(|p| p.id.parse::<u64>().ok())
            .max()
            .map_or(1, |n| n + 1);
        self.playlists.push(Playlist {
            id: next.to_string(),
            name,
            tracks: Vec::new(),
        });
        self.persist_playlists();
    }

    fn persist_playlists(&self) {
        self.session.state().persist(Record::Playlists, &self.playlists);
    }

    fn set_equalizer(&mut self, settings: EqualizerSettings) {
        self.transport.apply_equalizer(settings);
        self.session.state().persist(Record::Equalizer, &settings);
    }
}
