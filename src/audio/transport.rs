//! Lifecycle of the single loaded playback unit.
//!
//! The transport knows nothing about queues. It loads what it is told to,
//! fades units in and out, and reports the end of a track through
//! [`Transport::tick`].

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::PlaybackError;
use crate::library::Track;

use super::backend::{AudioBackend, PlaybackUnit};
use super::graph::{AudioGraph, EqualizerSettings};
use super::types::{TransportEvent, TransportState};

/// Linear volume ramp.
#[derive(Debug, Clone, Copy)]
struct Ramp {
    from: f32,
    to: f32,
    start: Instant,
    length: Duration,
}

impl Ramp {
    fn new(from: f32, to: f32, start: Instant, length: Duration) -> Self {
        Self {
            from,
            to,
            start,
            length,
        }
    }

    fn level(&self, now: Instant) -> f32 {
        if self.length.is_zero() {
            return self.to;
        }
        let t = (now.saturating_duration_since(self.start).as_secs_f32()
            / self.length.as_secs_f32())
        .clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    fn done(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.length
    }
}

struct Loaded<U> {
    track: Track,
    unit: U,
    ramp: Option<Ramp>,
}

/// A replaced unit fading to silence. Disposed once the ramp completes.
struct Retiring<U> {
    unit: U,
    ramp: Ramp,
}

pub struct Transport<B: AudioBackend> {
    backend: B,
    graph: AudioGraph,
    current: Option<Loaded<B::Unit>>,
    retiring: Vec<Retiring<B::Unit>>,
    state: TransportState,
    volume: f32,
    fade: Duration,
}

impl<B: AudioBackend> Transport<B> {
    pub fn new(backend: B, graph: AudioGraph, volume: f32, fade: Duration) -> Self {
        Self {
            backend,
            graph,
            current: None,
            retiring: Vec::new(),
            state: TransportState::Idle,
            volume: volume.clamp(0.0, 1.0),
            fade,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref().map(|c| &c.track)
    }

    /// Seconds into the loaded track.
    pub fn position(&self) -> f64 {
        match (&self.current, self.state) {
            (_, TransportState::Stopped) | (None, _) => 0.0,
            (Some(c), _) => c.unit.position().as_secs_f64(),
        }
    }

    /// Seconds; 0 when neither the decoder nor the catalog know.
    pub fn duration(&self) -> f64 {
        self.current
            .as_ref()
            .and_then(|c| {
                c.unit
                    .duration()
                    .map(|d| d.as_secs_f64())
                    .or(c.track.duration)
            })
            .unwrap_or(0.0)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn equalizer(&self) -> EqualizerSettings {
        self.graph.settings()
    }

    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Something audible is changing: playback progresses or a fade runs.
    pub fn needs_frames(&self) -> bool {
        self.state == TransportState::Playing
            || self.current.as_ref().is_some_and(|c| c.ramp.is_some())
            || !self.retiring.is_empty()
    }

    /// Fade the current unit out and hand it to the retiring list.
    fn retire_current(&mut self, now: Instant) {
        let Some(mut old) = self.current.take() else {
            return;
        };
        let from = old.ramp.map_or(old.unit.volume(), |r| r.level(now));
        if self.fade.is_zero() || self.state != TransportState::Playing {
            old.unit.stop();
            return;
        }
        self.retiring.push(Retiring {
            unit: old.unit,
            ramp: Ramp::new(from, 0.0, now, self.fade),
        });
    }

    /// Start `track` from the beginning. The unit starts muted and fades in;
    /// whatever was loaded before fades out concurrently.
    pub fn load_and_play(&mut self, track: Track, now: Instant) -> Result<(), PlaybackError> {
        self.retire_current(now);
        self.state = TransportState::Loading;

        let mut unit = match self.backend.load(&track) {
            Ok(u) => u,
            Err(e) => {
                warn!(track = %track.id, error = %e, "load failed");
                self.state = TransportState::Idle;
                return Err(e);
            }
        };

        unit.set_volume(0.0);
        if let Err(e) = unit.play() {
            warn!(track = %track.id, error = %e, "play refused");
            unit.stop();
            self.state = TransportState::Idle;
            return Err(e);
        }

        self.on_started(&mut unit)?;

        info!(track = %track.id, title = %track.title, "playing");
        self.current = Some(Loaded {
            track,
            unit,
            ramp: Some(Ramp::new(0.0, self.volume, now, self.fade)),
        });
        self.state = TransportState::Playing;
        Ok(())
    }

    fn on_started(&mut self, unit: &mut B::Unit) -> Result<(), PlaybackError> {
        if self.backend.is_suspended() {
            if let Err(e) = self.backend.resume_output() {
                unit.stop();
                self.state = TransportState::Idle;
                return Err(e);
            }
        }
        if self.graph.ensure_graph(&mut self.backend) {
            debug!("audio graph attached");
        }
        Ok(())
    }

    pub fn pause(&mut self) -> bool {
        if self.state != TransportState::Playing {
            return false;
        }
        if let Some(c) = self.current.as_mut() {
            c.unit.pause();
            c.ramp = None;
            c.unit.set_volume(self.volume);
        }
        self.state = TransportState::Paused;
        true
    }

    /// Continue a paused or parked unit. Resumes the output first when it
    /// was suspended.
    pub fn resume(&mut self) -> Result<bool, PlaybackError> {
        if !matches!(
            self.state,
            TransportState::Paused | TransportState::Stopped
        ) {
            return Ok(false);
        }
        let Some(mut current) = self.current.take() else {
            return Ok(false);
        };

        if self.backend.is_suspended() {
            if let Err(e) = self.backend.resume_output() {
                self.current = Some(current);
                return Err(e);
            }
        }
        self.graph.ensure_graph(&mut self.backend);

        if let Err(e) = current.unit.play() {
            current.unit.pause();
            self.current = Some(current);
            return Err(e);
        }
        current.unit.set_volume(self.volume);
        self.current = Some(current);
        self.state = TransportState::Playing;
        Ok(true)
    }

    /// Jump to `secs`, clamped to `[0, duration]`. Returns the clamped
    /// position, or `None` when nothing is loaded.
    pub fn seek(&mut self, secs: f64) -> Result<Option<f64>, PlaybackError> {
        let duration = self.duration();
        let Some(c) = self.current.as_mut() else {
            return Ok(None);
        };
        let mut target = secs.max(0.0);
        if duration > 0.0 {
            target = target.min(duration);
        }
        c.unit.seek(Duration::from_secs_f64(target))?;
        if self.state == TransportState::Stopped {
            self.state = TransportState::Paused;
        }
        Ok(Some(target))
    }

    /// Fade the current unit out and unload it.
    pub fn stop(&mut self, now: Instant) {
        self.retire_current(now);
        self.state = TransportState::Idle;
    }

    /// Swap a drained unit for a fresh one of the same track.
    fn ensure_fresh_unit(&mut self) -> Result<(), PlaybackError> {
        let Some(c) = self.current.as_mut() else {
            return Ok(());
        };
        if !c.unit.is_finished() {
            return Ok(());
        }
        let mut unit = self.backend.load(&c.track)?;
        unit.set_volume(self.volume);
        c.unit.stop();
        c.unit = unit;
        c.ramp = None;
        Ok(())
    }

    /// Park the loaded track at position 0 without playing it.
    pub fn rewind_and_halt(&mut self) -> Result<(), PlaybackError> {
        if self.current.is_none() {
            self.state = TransportState::Idle;
            return Ok(());
        }
        if let Err(e) = self.ensure_fresh_unit() {
            self.unload();
            return Err(e);
        }
        if let Some(c) = self.current.as_mut() {
            c.unit.pause();
            c.ramp = None;
            c.unit.set_volume(self.volume);
            if let Err(e) = c.unit.seek(Duration::ZERO) {
                debug!(error = %e, "rewind seek failed");
            }
        }
        self.state = TransportState::Stopped;
        Ok(())
    }

    /// Play the loaded track again from 0.
    pub fn restart(&mut self, now: Instant) -> Result<(), PlaybackError> {
        let Some(track) = self.current_track().cloned() else {
            return Ok(());
        };
        if let Err(e) = self.ensure_fresh_unit() {
            self.unload();
            return Err(e);
        }
        let rewound = self
            .current
            .as_mut()
            .map(|c| c.unit.seek(Duration::ZERO))
            .unwrap_or(Ok(()));
        if rewound.is_err() {
            // Some decoders cannot seek backwards; start over instead.
            return self.load_and_play(track, now);
        }
        self.state = TransportState::Paused;
        self.resume().map(|_| ())
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(c) = self.current.as_mut() {
            match c.ramp.as_mut() {
                Some(r) => r.to = self.volume,
                None => c.unit.set_volume(self.volume),
            }
        }
    }

    pub fn apply_equalizer(&mut self, settings: EqualizerSettings) {
        if !self.graph.apply_equalizer(settings) {
            debug!("equalizer stored; graph not built yet");
        }
    }

    /// Load `track` muted and paused, move to `position` once loaded and
    /// only then raise the volume. Nothing starts playing.
    pub fn restore(
        &mut self,
        track: Track,
        position: f64,
        volume: f32,
        now: Instant,
    ) -> Result<(), PlaybackError> {
        self.retire_current(now);
        self.state = TransportState::Loading;

        let mut unit = match self.backend.load(&track) {
            Ok(u) => u,
            Err(e) => {
                self.state = TransportState::Idle;
                return Err(e);
            }
        };
        unit.set_volume(0.0);
        if position > 0.0 {
            let mut target = position;
            if let Some(d) = unit.duration() {
                target = target.min(d.as_secs_f64());
            }
            if let Err(e) = unit.seek(Duration::from_secs_f64(target)) {
                warn!(track = %track.id, error = %e, "could not restore position");
            }
        }

        self.volume = volume.clamp(0.0, 1.0);
        unit.set_volume(self.volume);
        info!(track = %track.id, position, "session restored");
        self.current = Some(Loaded {
            track,
            unit,
            ramp: None,
        });
        self.state = TransportState::Paused;
        Ok(())
    }

    /// Drop the loaded unit immediately, without a fade.
    pub fn unload(&mut self) {
        if let Some(mut c) = self.current.take() {
            c.unit.stop();
        }
        self.state = TransportState::Idle;
    }

    /// Advance fades and detect the end of the current track.
    pub fn tick(&mut self, now: Instant) -> Option<TransportEvent> {
        self.retiring.retain_mut(|r| {
            if r.ramp.done(now) {
                r.unit.stop();
                false
            } else {
                r.unit.set_volume(r.ramp.level(now));
                true
            }
        });

        let c = self.current.as_mut()?;
        if let Some(r) = c.ramp {
            c.unit.set_volume(r.level(now));
            if r.done(now) {
                c.ramp = None;
            }
        }

        if self.state == TransportState::Playing && c.unit.is_finished() {
            debug!(track = %c.track.id, "track ended");
            self.state = TransportState::Ended;
            return Some(TransportEvent::Ended);
        }
        None
    }

    /// Blocking fade-out used on quit.
    pub fn shutdown(&mut self, fade: Duration) {
        for mut r in self.retiring.drain(..) {
            r.unit.stop();
        }
        let Some(mut c) = self.current.take() else {
            return;
        };
        if self.state == TransportState::Playing && !fade.is_zero() {
            let steps: u32 = 20;
            let start = c.unit.volume();
            let step = (fade / steps).max(Duration::from_millis(1));
            for i in 1..=steps {
                let t = i as f32 / steps as f32;
                c.unit.set_volume(start * (1.0 - t));
                thread::sleep(step);
            }
        }
        c.unit.set_volume(0.0);
        c.unit.stop();
        self.state = TransportState::Stopped;
    }
}
