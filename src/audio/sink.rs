//! `rodio` implementation of the audio backend.
//!
//! Every loaded track becomes its own paused `Sink` on the shared output
//! stream, with the decoder wrapped in a [`GraphSource`] so the equalizer
//! and analyser see the audio.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, info};

use crate::error::PlaybackError;
use crate::library::Track;

use super::backend::{AudioBackend, GraphHost, PlaybackUnit};
use super::graph::GraphNodes;
use super::tap::{GraphSlot, GraphSource};

const OUTPUT: &str = "audio output";

/// Sources are plain paths, optionally written as `file://` URLs.
fn source_path(source: &str) -> &Path {
    Path::new(source.strip_prefix("file://").unwrap_or(source))
}

pub struct RodioBackend {
    stream: Option<OutputStream>,
    slot: Arc<GraphSlot>,
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RodioBackend {
    /// The output device is opened lazily, on the first load or resume.
    pub fn new() -> Self {
        Self {
            stream: None,
            slot: Arc::new(GraphSlot::default()),
        }
    }

    fn open_stream(&mut self) -> Result<&OutputStream, PlaybackError> {
        if self.stream.is_none() {
            let mut stream = OutputStreamBuilder::open_default_stream()
                .map_err(|e| PlaybackError::play(OUTPUT, e.to_string()))?;
            // rodio logs to stderr when OutputStream is dropped, which would
            // scribble over the terminal.
            stream.log_on_drop(false);
            info!("audio output opened");
            self.stream = Some(stream);
        }
        self.stream
            .as_ref()
            .ok_or_else(|| PlaybackError::play(OUTPUT, "output stream unavailable"))
    }
}

impl GraphHost for RodioBackend {
    fn route_graph(&mut self, nodes: &Arc<GraphNodes>) {
        if !self.slot.install(nodes) {
            debug!("audio graph already routed");
        }
    }
}

impl AudioBackend for RodioBackend {
    type Unit = RodioUnit;

    fn load(&mut self, track: &Track) -> Result<RodioUnit, PlaybackError> {
        let file = File::open(source_path(&track.source))
            .map_err(|e| PlaybackError::load(&track.source, e.to_string()))?;
        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| PlaybackError::load(&track.source, e.to_string()))?;

        let duration = decoder
            .total_duration()
            .or_else(|| track.duration.and_then(|d| Duration::try_from_secs_f64(d).ok()));

        let slot = Arc::clone(&self.slot);
        let stream = self.open_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        sink.append(GraphSource::new(decoder, slot));

        Ok(RodioUnit {
            sink,
            source: track.source.clone(),
            duration,
        })
    }

    fn is_suspended(&self) -> bool {
        self.stream.is_none()
    }

    fn resume_output(&mut self) -> Result<(), PlaybackError> {
        self.open_stream().map(|_| ())
    }
}

pub struct RodioUnit {
    sink: Sink,
    source: String,
    duration: Option<Duration>,
}

impl PlaybackUnit for RodioUnit {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn volume(&self) -> f32 {
        self.sink.volume()
    }

    fn seek(&mut self, to: Duration) -> Result<(), PlaybackError> {
        self.sink
            .try_seek(to)
            .map_err(|e| PlaybackError::play(&self.source, e.to_string()))
    }

    fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_finished(&self) -> bool {
        self.sink.empty()
    }
}
