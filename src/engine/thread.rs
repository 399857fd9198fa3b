use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::audio::{AudioBackend, PlaybackHandle, QueueHandle};

use super::actor::Engine;
use super::cmd::EngineCmd;

/// Spawn the engine thread. `build` runs on that thread, so the backend
/// (which may hold a non-`Send` output stream) never crosses threads.
pub(super) fn spawn_engine_thread<B, F>(
    tx: Sender<EngineCmd>,
    rx: Receiver<EngineCmd>,
    playback: PlaybackHandle,
    queue: QueueHandle,
    frame: Duration,
    build: F,
) -> JoinHandle<()>
where
    B: AudioBackend + 'static,
    F: FnOnce(&Sender<EngineCmd>) -> Engine<B> + Send + 'static,
{
    thread::spawn(move || {
        let mut engine = build(&tx).with_handles(playback, queue);
        // Only helper threads should keep the channel open.
        drop(tx);
        run(&mut engine, &rx, frame);
    })
}

/// Block on the channel while idle; poll every `frame` while something
/// audible is changing so fades and progress advance.
pub(super) fn run<B: AudioBackend>(
    engine: &mut Engine<B>,
    rx: &Receiver<EngineCmd>,
    frame: Duration,
) {
    loop {
        let cmd = if engine.needs_frames() {
            match rx.recv_timeout(frame) {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break,
            }
        };

        match cmd {
            Some(EngineCmd::Quit { fade_out_ms }) => {
                engine.shutdown(Duration::from_millis(fade_out_ms), Instant::now());
                return;
            }
            Some(cmd) => engine.handle(cmd, Instant::now()),
            None => {}
        }
        engine.tick(Instant::now());
    }

    debug!("engine channel closed");
    engine.shutdown(Duration::ZERO, Instant::now());
}
