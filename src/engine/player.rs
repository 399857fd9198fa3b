use std::sync::mpsc::{self, SendError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::audio::{AudioBackend, PlaybackHandle, PlaybackState, QueueHandle, QueueView};

use super::actor::Engine;
use super::cmd::{EngineCmd, Intent};
use super::thread::spawn_engine_thread;

/// Handle to the engine thread, held by the runtime.
pub struct EnginePlayer {
    tx: Sender<EngineCmd>,
    playback: PlaybackHandle,
    queue: QueueHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl EnginePlayer {
    /// Start the engine thread. `build` gets a sender for helpers that feed
    /// the engine (the sync reader, for one).
    pub fn start<B, F>(frame: Duration, build: F) -> Self
    where
        B: AudioBackend + 'static,
        F: FnOnce(&Sender<EngineCmd>) -> Engine<B> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let playback: PlaybackHandle = Arc::new(Mutex::new(PlaybackState::default()));
        let queue: QueueHandle = Arc::new(Mutex::new(QueueView::default()));

        let join = spawn_engine_thread(
            tx.clone(),
            rx,
            Arc::clone(&playback),
            Arc::clone(&queue),
            frame,
            build,
        );

        Self {
            tx,
            playback,
            queue,
            join: Mutex::new(Some(join)),
        }
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    pub fn queue_handle(&self) -> QueueHandle {
        self.queue.clone()
    }

    pub fn sender(&self) -> Sender<EngineCmd> {
        self.tx.clone()
    }

    pub fn send(&self, intent: Intent) -> Result<(), SendError<EngineCmd>> {
        self.tx.send(EngineCmd::Intent(intent))
    }

    /// Fade out over `fade_out`, save, and wait for the thread to finish.
    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.tx.send(EngineCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}
