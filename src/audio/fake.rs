//! In-memory backend for tests. Every unit reports into a shared probe so
//! tests can inspect units after the transport took ownership of them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::PlaybackError;
use crate::library::Track;

use super::backend::{AudioBackend, GraphHost, PlaybackUnit};
use super::graph::GraphNodes;

#[derive(Debug, Default)]
pub struct UnitProbe {
    pub source: String,
    pub playing: bool,
    pub stopped: bool,
    pub volume: f32,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub finished: bool,
    pub seeks: Vec<Duration>,
}

pub type Probe = Arc<Mutex<UnitProbe>>;

pub struct FakeBackend {
    pub units: Vec<Probe>,
    pub fail_load: HashSet<String>,
    pub fail_play: HashSet<String>,
    pub suspended: bool,
    pub resumes: usize,
    pub routes: usize,
    pub routed: Option<Arc<GraphNodes>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            units: Vec::new(),
            fail_load: HashSet::new(),
            fail_play: HashSet::new(),
            suspended: true,
            resumes: 0,
            routes: 0,
            routed: None,
        }
    }
}

impl FakeBackend {
    pub fn last(&self) -> Probe {
        Arc::clone(self.units.last().expect("no unit loaded"))
    }

    /// Units that were not stopped yet.
    pub fn live_units(&self) -> usize {
        self.units
            .iter()
            .filter(|p| !p.lock().unwrap().stopped)
            .count()
    }
}

/// Mark the unit as drained, like a decoder reaching end of file.
pub fn finish(probe: &Probe) {
    let mut p = probe.lock().unwrap();
    p.finished = true;
    if let Some(d) = p.duration {
        p.position = d;
    }
}

impl GraphHost for FakeBackend {
    fn route_graph(&mut self, nodes: &Arc<GraphNodes>) {
        self.routes += 1;
        if self.routed.is_none() {
            self.routed = Some(Arc::clone(nodes));
        }
    }
}

impl AudioBackend for FakeBackend {
    type Unit = FakeUnit;

    fn load(&mut self, track: &Track) -> Result<FakeUnit, PlaybackError> {
        if self.fail_load.contains(&track.source) {
            return Err(PlaybackError::load(&track.source, "unsupported format"));
        }
        let probe = Arc::new(Mutex::new(UnitProbe {
            source: track.source.clone(),
            volume: 1.0,
            duration: Some(Duration::from_secs_f64(track.duration.unwrap_or(180.0))),
            ..UnitProbe::default()
        }));
        self.units.push(Arc::clone(&probe));
        Ok(FakeUnit {
            probe,
            refuse_play: self.fail_play.contains(&track.source),
        })
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume_output(&mut self) -> Result<(), PlaybackError> {
        self.resumes += 1;
        self.suspended = false;
        Ok(())
    }
}

pub struct FakeUnit {
    probe: Probe,
    refuse_play: bool,
}

impl PlaybackUnit for FakeUnit {
    fn play(&mut self) -> Result<(), PlaybackError> {
        let mut p = self.probe.lock().unwrap();
        if self.refuse_play {
            return Err(PlaybackError::play(p.source.clone(), "autoplay blocked"));
        }
        p.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.probe.lock().unwrap().playing = false;
    }

    fn stop(&mut self) {
        let mut p = self.probe.lock().unwrap();
        p.playing = false;
        p.stopped = true;
    }

    fn set_volume(&mut self, volume: f32) {
        self.probe.lock().unwrap().volume = volume;
    }

    fn volume(&self) -> f32 {
        self.probe.lock().unwrap().volume
    }

    fn seek(&mut self, to: Duration) -> Result<(), PlaybackError> {
        let mut p = self.probe.lock().unwrap();
        p.position = to;
        p.seeks.push(to);
        Ok(())
    }

    fn position(&self) -> Duration {
        self.probe.lock().unwrap().position
    }

    fn duration(&self) -> Option<Duration> {
        self.probe.lock().unwrap().duration
    }

    fn is_finished(&self) -> bool {
        self.probe.lock().unwrap().finished
    }
}
