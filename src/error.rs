//! Error types shared across the engine.
//!
//! `PlaybackError` is the user-facing taxonomy carried on `PlaybackState`.
//! The remaining enums describe failures of the surrounding plumbing
//! (local storage, the sync socket and the catalog).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that surface on `PlaybackState::error`.
///
/// None of these are fatal: the engine always stays able to accept the
/// next intent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// The source could not be opened or decoded.
    #[error("could not load {source_ref}: {reason}")]
    Load { source_ref: String, reason: String },

    /// The platform refused to start or reposition playback.
    #[error("playback refused for {source_ref}: {reason}")]
    Play { source_ref: String, reason: String },

    /// The catalog fetch failed; the next poll will retry.
    #[error("library unavailable: {0}")]
    LibraryUnavailable(String),

    /// The stored session snapshot could not be used.
    #[error("stored session is unusable: {0}")]
    SessionCorrupt(String),
}

impl PlaybackError {
    pub fn load(source_ref: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }

    pub fn play(source_ref: impl Into<String>, reason: impl ToString) -> Self {
        Self::Play {
            source_ref: source_ref.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync socket error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid sync message: {0}")]
    Message(#[from] serde_json::Error),

    #[error("sync channel is not connected")]
    NotConnected,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("music root {0} does not exist or is not a directory")]
    MissingRoot(PathBuf),

    #[error("catalog has not been scanned yet")]
    NotScanned,

    #[error("catalog I/O error: {0}")]
    Io(#[from] io::Error),
}
