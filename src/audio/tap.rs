//! `rodio` source adapter that runs samples through the shared graph.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use rodio::{ChannelCount, SampleRate, Source};

use super::biquad::BiquadState;
use super::graph::{ChainCoefficients, GraphNodes};

/// Filter coefficients are re-checked this often (in samples).
const REFRESH_EVERY: usize = 256;
/// Mono frames handed to the analyser at once.
const ANALYSER_BLOCK: usize = 512;

/// Where the backend installs the graph nodes. Sources created before the
/// graph exists pick the nodes up as soon as they appear.
#[derive(Default)]
pub struct GraphSlot {
    nodes: OnceLock<Arc<GraphNodes>>,
}

impl GraphSlot {
    /// Returns `false` when the slot was already connected.
    pub fn install(&self, nodes: &Arc<GraphNodes>) -> bool {
        self.nodes.set(Arc::clone(nodes)).is_ok()
    }

    pub fn get(&self) -> Option<&Arc<GraphNodes>> {
        self.nodes.get()
    }
}

pub struct GraphSource<S> {
    inner: S,
    slot: Arc<GraphSlot>,
    nodes: Option<Arc<GraphNodes>>,
    channels: usize,
    sample_rate: f64,
    coeffs: ChainCoefficients,
    seen_version: Option<u64>,
    states: Vec<[BiquadState; 3]>,
    channel: usize,
    countdown: usize,
    mono: f32,
    block: Vec<f32>,
}

impl<S> GraphSource<S>
where
    S: Source,
{
    pub fn new(inner: S, slot: Arc<GraphSlot>) -> Self {
        let channels = usize::from(inner.channels()).max(1);
        let sample_rate = f64::from(inner.sample_rate());
        Self {
            inner,
            slot,
            nodes: None,
            channels,
            sample_rate,
            coeffs: ChainCoefficients::default(),
            seen_version: None,
            states: vec![[BiquadState::default(); 3]; channels],
            channel: 0,
            countdown: 0,
            mono: 0.0,
            block: Vec::with_capacity(ANALYSER_BLOCK),
        }
    }
}

impl<S> Iterator for GraphSource<S>
where
    S: Source,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;

        if self.nodes.is_none() {
            self.nodes = self.slot.get().cloned();
        }
        let Some(nodes) = self.nodes.as_ref() else {
            return Some(sample);
        };

        if self.countdown == 0 {
            let v = nodes.eq.version();
            if self.seen_version != Some(v) {
                self.coeffs = ChainCoefficients::design(&nodes.eq.load(), self.sample_rate);
                self.seen_version = Some(v);
            }
            self.countdown = REFRESH_EVERY;
        }
        self.countdown -= 1;

        let ch = self.channel;
        self.channel = (self.channel + 1) % self.channels;

        let mut y = sample * self.coeffs.preamp;
        for (state, c) in self.states[ch].iter_mut().zip(self.coeffs.stages.iter()) {
            y = state.process(c, y);
        }

        self.mono += y;
        if self.channel == 0 {
            self.block.push(self.mono / self.channels as f32);
            self.mono = 0.0;
            if self.block.len() >= ANALYSER_BLOCK {
                nodes.analyser.try_push(&self.block);
                self.block.clear();
            }
        }

        Some(y)
    }
}

impl<S> Source for GraphSource<S>
where
    S: Source,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> ChannelCount {
        self.inner.channels()
    }

    fn sample_rate(&self) -> SampleRate {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), rodio::source::SeekError> {
        self.states.iter_mut().for_each(|s| *s = [BiquadState::default(); 3]);
        self.channel = 0;
        self.mono = 0.0;
        self.inner.try_seek(pos)
    }
}
