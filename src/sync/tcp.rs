use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc::Sender;
use std::thread;

use tracing::{info, warn};

use crate::engine::EngineCmd;
use crate::error::SyncError;

use super::client::SyncChannel;
use super::message::SyncMessage;

/// Newline-delimited JSON over TCP to a [`Relay`](super::Relay).
pub struct TcpChannel {
    writer: TcpStream,
}

impl TcpChannel {
    /// Connect and start a reader thread that feeds remote messages into
    /// the engine.
    pub fn connect(addr: &str, engine: Sender<EngineCmd>) -> Result<Self, SyncError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let reader = stream.try_clone()?;
        thread::spawn(move || {
            forward_lines(BufReader::new(reader), |msg| {
                engine.send(EngineCmd::Remote(msg)).is_ok()
            })
        });
        info!(addr, "connected to sync relay");
        Ok(Self { writer: stream })
    }
}

impl SyncChannel for TcpChannel {
    fn publish(&mut self, msg: &SyncMessage) -> Result<(), SyncError> {
        let line = msg.to_line()?;
        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        // Unblocks the reader thread.
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

/// Decode each line and hand it to `deliver` until the stream ends or
/// `deliver` returns `false`. Undecodable lines are skipped.
pub(super) fn forward_lines<R: BufRead>(reader: R, mut deliver: impl FnMut(SyncMessage) -> bool) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, "sync connection lost");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match SyncMessage::from_line(&line) {
            Ok(msg) => {
                if !deliver(msg) {
                    return;
                }
            }
            Err(e) => warn!(error = %e, "skipping undecodable sync message"),
        }
    }
    warn!("sync relay closed the connection");
}
