use tracing::{debug, info, warn};

use crate::error::SyncError;

use super::message::SyncMessage;

/// Outbound half of the room connection.
pub trait SyncChannel: Send {
    fn publish(&mut self, msg: &SyncMessage) -> Result<(), SyncError>;
}

/// Publishes local intents and tracks whether a remote message is being
/// applied.
///
/// The remote flag is a plain bool: the engine handles one command to
/// completion before the next, so nothing else can observe it mid-apply.
pub struct SyncClient {
    channel: Option<Box<dyn SyncChannel>>,
    room: Option<String>,
    applying_remote: bool,
}

impl SyncClient {
    /// A client that never publishes. Used when sync is disabled or the
    /// relay could not be reached.
    pub fn disconnected() -> Self {
        Self {
            channel: None,
            room: None,
            applying_remote: false,
        }
    }

    pub fn new(channel: Box<dyn SyncChannel>) -> Self {
        Self {
            channel: Some(channel),
            room: None,
            applying_remote: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn join(&mut self, room: &str) -> Result<(), SyncError> {
        let channel = self.channel.as_mut().ok_or(SyncError::NotConnected)?;
        channel.publish(&SyncMessage::JoinRoom {
            room: room.to_string(),
        })?;
        info!(room, "joined sync room");
        self.room = Some(room.to_string());
        Ok(())
    }

    /// Send a local intent to the room. Returns whether it went out.
    ///
    /// Nothing is sent while a remote message is being applied.
    pub fn publish(&mut self, msg: SyncMessage) -> bool {
        if self.applying_remote {
            debug!(kind = msg.kind(), "suppressed echo of remote command");
            return false;
        }
        let Some(channel) = self.channel.as_mut() else {
            return false;
        };
        match channel.publish(&msg) {
            Ok(()) => {
                debug!(kind = msg.kind(), "published");
                true
            }
            Err(e) => {
                warn!(error = %e, "sync connection lost; continuing locally");
                self.channel = None;
                false
            }
        }
    }

    pub fn begin_remote(&mut self) {
        self.applying_remote = true;
    }

    pub fn end_remote(&mut self) {
        self.applying_remote = false;
    }

    pub fn is_applying_remote(&self) -> bool {
        self.applying_remote
    }
}
