//! Equalizer chain and analyser, built once and shared by every unit.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::analyser::AnalyserHandle;
use super::backend::GraphHost;
use super::biquad::Coefficients;

pub const BASS_HZ: f64 = 200.0;
pub const MID_HZ: f64 = 1_000.0;
pub const MID_Q: f64 = 1.0;
pub const TREBLE_HZ: f64 = 3_000.0;

/// Gains in dB. Zero everywhere is a flat response.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualizerSettings {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub preamp: f32,
}

/// Lock-free gain storage read by the audio callback.
///
/// `version` bumps on every store so readers only redesign filters when
/// something actually changed.
#[derive(Debug, Default)]
pub struct EqControls {
    gains: [AtomicU32; 4],
    version: AtomicU64,
}

impl EqControls {
    fn new(settings: EqualizerSettings) -> Self {
        let c = Self::default();
        c.store(settings);
        c
    }

    pub fn store(&self, s: EqualizerSettings) {
        for (slot, v) in self.gains.iter().zip([s.bass, s.mid, s.treble, s.preamp]) {
            slot.store(v.to_bits(), Ordering::Relaxed);
        }
        self.version.fetch_add(1, Ordering::Release);
    }

    pub fn load(&self) -> EqualizerSettings {
        let g = |i: usize| f32::from_bits(self.gains[i].load(Ordering::Relaxed));
        EqualizerSettings {
            bass: g(0),
            mid: g(1),
            treble: g(2),
            preamp: g(3),
        }
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

/// Preamp plus the three series stages: bass low-shelf, mid peak, treble
/// high-shelf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub preamp: f32,
    pub stages: [Coefficients; 3],
}

impl Default for ChainCoefficients {
    fn default() -> Self {
        Self {
            preamp: 1.0,
            stages: [Coefficients::identity(); 3],
        }
    }
}

impl ChainCoefficients {
    pub fn design(s: &EqualizerSettings, sample_rate: f64) -> Self {
        Self {
            preamp: 10.0_f32.powf(s.preamp / 20.0),
            stages: [
                Coefficients::low_shelf(sample_rate, BASS_HZ, s.bass as f64),
                Coefficients::peaking(sample_rate, MID_HZ, MID_Q, s.mid as f64),
                Coefficients::high_shelf(sample_rate, TREBLE_HZ, s.treble as f64),
            ],
        }
    }
}

pub struct GraphNodes {
    pub eq: EqControls,
    pub analyser: AnalyserHandle,
}

/// Owner of the process-wide graph nodes.
pub struct AudioGraph {
    nodes: Option<Arc<GraphNodes>>,
    settings: EqualizerSettings,
    analyser: AnalyserHandle,
}

impl AudioGraph {
    pub fn new(analyser: AnalyserHandle, settings: EqualizerSettings) -> Self {
        Self {
            nodes: None,
            settings,
            analyser,
        }
    }

    /// Build the nodes on first use and (re-)route them through `host`.
    /// Safe to call any number of times; returns `true` only on the call
    /// that built the graph.
    pub fn ensure_graph<H: GraphHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let built = self.nodes.is_none();
        if built {
            debug!(settings = ?self.settings, "building audio graph");
            self.nodes = Some(Arc::new(GraphNodes {
                eq: EqControls::new(self.settings),
                analyser: self.analyser.clone(),
            }));
        }
        if let Some(nodes) = &self.nodes {
            host.route_graph(nodes);
        }
        built
    }

    /// Remember `settings` and push them to the filters if they exist.
    /// Before the graph is built this only records the settings.
    pub fn apply_equalizer(&mut self, settings: EqualizerSettings) -> bool {
        self.settings = settings;
        match &self.nodes {
            Some(nodes) => {
                nodes.eq.store(settings);
                true
            }
            None => false,
        }
    }

    pub fn settings(&self) -> EqualizerSettings {
        self.settings
    }

    pub fn is_built(&self) -> bool {
        self.nodes.is_some()
    }

    pub fn nodes(&self) -> Option<&Arc<GraphNodes>> {
        self.nodes.as_ref()
    }

    pub fn analyser(&self) -> AnalyserHandle {
        self.analyser.clone()
    }
}
