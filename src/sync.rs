//! Room-scoped mirroring of transport commands between clients.
//!
//! Local intents are published through a [`SyncChannel`]; messages from
//! other clients come back into the engine as `EngineCmd::Remote` and are
//! applied with the client's remote flag raised, so they are never
//! published again.

mod client;
mod message;
mod relay;
mod tcp;

pub use client::{SyncChannel, SyncClient};
pub use message::SyncMessage;
pub use relay::Relay;
pub use tcp::TcpChannel;

#[cfg(test)]
mod tests;
