//! Read-only analysis tap at the end of the filter chain.

use std::sync::{Arc, Mutex};

use rustfft::{FftPlanner, num_complex::Complex};

/// Samples kept for analysis (mono, most recent last).
pub const WINDOW: usize = 2048;

struct Ring {
    buf: Vec<f32>,
    pos: usize,
    filled: usize,
}

impl Ring {
    fn push(&mut self, samples: &[f32]) {
        for &s in samples {
            self.buf[self.pos] = s;
            self.pos = (self.pos + 1) % WINDOW;
        }
        self.filled = (self.filled + samples.len()).min(WINDOW);
    }

    fn chronological(&self) -> Vec<f32> {
        let start = (self.pos + WINDOW - self.filled) % WINDOW;
        (0..self.filled)
            .map(|i| self.buf[(start + i) % WINDOW])
            .collect()
    }
}

/// Shared by the audio callback (writer) and any display consumer (reader).
pub struct Analyser {
    ring: Mutex<Ring>,
}

pub type AnalyserHandle = Arc<Analyser>;

impl Default for Analyser {
    fn default() -> Self {
        Self {
            ring: Mutex::new(Ring {
                buf: vec![0.0; WINDOW],
                pos: 0,
                filled: 0,
            }),
        }
    }
}

impl Analyser {
    pub fn handle() -> AnalyserHandle {
        Arc::new(Self::default())
    }

    pub fn push(&self, samples: &[f32]) {
        if let Ok(mut ring) = self.ring.lock() {
            ring.push(samples);
        }
    }

    /// Non-blocking variant for the audio callback; drops the block when a
    /// reader holds the lock.
    pub(super) fn try_push(&self, samples: &[f32]) {
        if let Ok(mut ring) = self.ring.try_lock() {
            ring.push(samples);
        }
    }

    pub fn waveform(&self) -> Vec<f32> {
        self.ring
            .lock()
            .map(|r| r.chronological())
            .unwrap_or_default()
    }

    pub fn rms(&self) -> f32 {
        let samples = self.waveform();
        if samples.is_empty() {
            return 0.0;
        }
        let sum: f32 = samples.iter().map(|s| s * s).sum();
        (sum / samples.len() as f32).sqrt()
    }

    /// Magnitude spectrum of the current window (Hann weighted), `WINDOW / 2`
    /// bins from DC up to Nyquist.
    pub fn spectrum(&self) -> Vec<f32> {
        let samples = self.waveform();

        let mut buffer: Vec<Complex<f32>> = Vec::with_capacity(WINDOW);
        for (i, &s) in samples.iter().enumerate() {
            let w = 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / (WINDOW - 1) as f32).cos();
            buffer.push(Complex::new(s * w, 0.0));
        }
        buffer.resize(WINDOW, Complex::new(0.0, 0.0));

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(WINDOW);
        fft.process(&mut buffer);

        buffer[..WINDOW / 2]
            .iter()
            .map(|c| c.norm() / WINDOW as f32)
            .collect()
    }
}
