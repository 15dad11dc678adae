//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with cpal, rodio, the AMR file format and the filesystem.

pub mod audio;
pub mod config;
pub mod events;
pub mod playback;
pub mod recording;
pub mod session;
pub mod transcoding;

// Re-export adapters
pub use config::XdgConfigStore;
pub use events::BroadcastEventSink;
pub use playback::RodioPlayer;
pub use recording::CpalRecorder;
pub use session::CpalAudioSession;
pub use transcoding::AmrTranscoder;
