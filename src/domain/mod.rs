//! Domain layer - Core voice resource logic
//!
//! Contains value objects, the playback state machine, wire messages
//! and domain errors. This layer has no dependencies on audio devices.

pub mod config;
pub mod error;
pub mod recording;
pub mod voice;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use recording::{PowerReading, RecorderSettings};
pub use voice::{
    BridgeCommand, BridgeReply, BridgeRequest, MsgType, ResourceResolver, ResourceUrl,
    VoiceEvent, VoiceState,
};
