//! Audio subsystem: the transport, the platform backend and the
//! equalizer/analyser graph.

mod analyser;
mod backend;
mod biquad;
mod graph;
mod sink;
mod tap;
mod transport;
mod types;

pub use analyser::{Analyser, AnalyserHandle};
pub use backend::{AudioBackend, GraphHost, PlaybackUnit};
pub use graph::{AudioGraph, EqualizerSettings, GraphNodes};
pub use sink::RodioBackend;
pub use transport::Transport;
pub use types::*;

#[cfg(test)]
pub(crate) mod fake;
#[cfg(test)]
mod tests;
