//! Minimal room relay: every message a client sends after `join_room` is
//! forwarded verbatim to the other clients in the same room.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::message::SyncMessage;

struct Peer {
    room: Option<String>,
    writer: TcpStream,
}

type Peers = Arc<Mutex<HashMap<u64, Peer>>>;

pub struct Relay {
    listener: TcpListener,
    peers: Peers,
}

impl Relay {
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr)?,
            peers: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept clients forever, one thread per client.
    pub fn serve(self) -> io::Result<()> {
        info!(addr = %self.listener.local_addr()?, "relay listening");
        for (id, stream) in (0u64..).zip(self.listener.incoming()) {
            match stream {
                Ok(stream) => {
                    let peers = Arc::clone(&self.peers);
                    thread::spawn(move || handle_peer(id, stream, peers));
                }
                Err(e) => warn!(error = %e, "failed to accept client"),
            }
        }
        Ok(())
    }

    pub fn spawn(self) -> JoinHandle<io::Result<()>> {
        thread::spawn(move || self.serve())
    }
}

fn handle_peer(id: u64, stream: TcpStream, peers: Peers) {
    let addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "?".to_string());
    let writer = match stream.try_clone() {
        Ok(w) => w,
        Err(e) => {
            warn!(%addr, error = %e, "could not clone client socket");
            return;
        }
    };
    if let Ok(mut p) = peers.lock() {
        p.insert(id, Peer { room: None, writer });
    }
    info!(%addr, id, "client connected");

    for line in BufReader::new(stream).lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match SyncMessage::from_line(&line) {
            Ok(SyncMessage::JoinRoom { room }) => {
                info!(%addr, %room, "client joined room");
                if let Ok(mut p) = peers.lock() {
                    if let Some(peer) = p.get_mut(&id) {
                        peer.room = Some(room);
                    }
                }
            }
            Ok(msg) => {
                debug!(%addr, kind = msg.kind(), "relaying");
                forward(id, line.trim(), &peers);
            }
            Err(e) => warn!(%addr, error = %e, "dropping undecodable line"),
        }
    }

    if let Ok(mut p) = peers.lock() {
        p.remove(&id);
    }
    info!(%addr, id, "client disconnected");
}

fn forward(from: u64, line: &str, peers: &Peers) {
    // Writes happen outside the lock so one stalled client cannot hold up
    // the others.
    let targets = {
        let Ok(peers) = peers.lock() else {
            return;
        };
        let Some(room) = peers.get(&from).and_then(|p| p.room.as_deref()) else {
            debug!(from, "message before join_room dropped");
            return;
        };
        room_writers(&peers, from, room)
    };

    let payload = format!("{line}\n");
    let dead: Vec<u64> = targets
        .into_iter()
        .filter_map(|(id, mut writer)| writer.write_all(payload.as_bytes()).err().map(|_| id))
        .collect();
    if dead.is_empty() {
        return;
    }
    if let Ok(mut peers) = peers.lock() {
        for id in dead {
            peers.remove(&id);
        }
    }
}

/// Cloned sockets of every other client in `room`.
fn room_writers(peers: &HashMap<u64, Peer>, from: u64, room: &str) -> Vec<(u64, TcpStream)> {
    peers
        .iter()
        .filter(|&(&id, peer)| id != from && peer.room.as_deref() == Some(room))
        .filter_map(|(&id, peer)| match peer.writer.try_clone() {
            Ok(w) => Some((id, w)),
            Err(e) => {
                warn!(id, error = %e, "could not clone client socket");
                None
            }
        })
        .collect()
}
