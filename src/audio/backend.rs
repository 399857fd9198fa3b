//! Seams between the transport and the platform audio primitive.

use std::sync::Arc;
use std::time::Duration;

use crate::error::PlaybackError;
use crate::library::Track;

use super::graph::GraphNodes;

/// One decoded, playable track.
pub trait PlaybackUnit {
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    /// Silence and release the unit. It cannot be played again.
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;
    fn seek(&mut self, to: Duration) -> Result<(), PlaybackError>;
    fn position(&self) -> Duration;
    fn duration(&self) -> Option<Duration>;
    /// The source has run dry.
    fn is_finished(&self) -> bool;
}

/// Something the graph nodes can be connected to. Routing the same nodes
/// twice must be harmless.
pub trait GraphHost {
    fn route_graph(&mut self, nodes: &Arc<GraphNodes>);
}

pub trait AudioBackend: GraphHost {
    type Unit: PlaybackUnit;

    /// Decode `track` into a paused unit.
    fn load(&mut self, track: &Track) -> Result<Self::Unit, PlaybackError>;
    /// The output has not been started yet (or was released).
    fn is_suspended(&self) -> bool;
    fn resume_output(&mut self) -> Result<(), PlaybackError>;
}
