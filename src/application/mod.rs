//! Application layer - Use cases and port interfaces
//!
//! Contains the handle cache, the playback and recording controllers and
//! the bridge adapter, plus trait definitions for native audio.

pub mod bridge;
pub mod handle_cache;
pub mod playback;
pub mod ports;
pub mod recording;
pub mod session;
pub mod voice_file;

#[cfg(test)]
pub(crate) mod testing;

// Re-export use cases
pub use bridge::{BridgeAdapter, BridgeConfig, BridgePorts, ResourceSnapshot};
pub use handle_cache::HandleCache;
pub use playback::PlaybackController;
pub use recording::RecordingController;
pub use session::AudioSessionState;
pub use voice_file::VoiceFile;
