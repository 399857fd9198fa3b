//! Audio-related small types and handles.
//!
//! This module defines the transport state machine's states and the shared
//! snapshots the engine publishes for display consumers.

use std::sync::{Arc, Mutex};

use crate::error::PlaybackError;
use crate::library::{Track, TrackId};
use crate::queue::RepeatMode;

/// Lifecycle of the loaded unit.
///
/// `Idle → Loading → Playing ⇄ Paused → (Ended | Stopped)`
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    /// The source ran dry; the engine decides what comes next.
    Ended,
    /// Parked at position 0 with the track still loaded.
    Stopped,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Ended,
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Runtime playback information shared with display consumers.
pub struct PlaybackState {
    pub current: Option<Track>,
    pub transport: TransportState,
    pub playing: bool,
    /// Seconds.
    pub position: f64,
    /// Seconds; 0 when unknown.
    pub duration: f64,
    pub volume: f32,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub error: Option<PlaybackError>,
}

/// Queue contents plus the play history window, newest history entry last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueView {
    pub tracks: Vec<TrackId>,
    pub index: Option<usize>,
    pub history: Vec<TrackId>,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackState>>;
pub type QueueHandle = Arc<Mutex<QueueView>>;
