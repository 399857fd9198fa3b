use serde::{Deserialize, Serialize};

use crate::library::Track;

/// Wire format: one JSON object per line, tagged by `type`.
///
/// `{"type":"play"}`, `{"type":"pause"}`, `{"type":"seek","time":30.0}`,
/// `{"type":"change_song","track":{..}}`, `{"type":"join_room","room":"x"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    JoinRoom { room: String },
    Play,
    Pause,
    Seek { time: f64 },
    ChangeSong { track: Track },
}

impl SyncMessage {
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join_room",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Seek { .. } => "seek",
            Self::ChangeSong { .. } => "change_song",
        }
    }
}
