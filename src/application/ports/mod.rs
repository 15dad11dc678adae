//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_session;
pub mod config;
pub mod event_sink;
pub mod player;
pub mod recorder;
pub mod transcoder;

// Re-export common types
pub use audio_session::{AudioSession, SessionCategory, SessionError};
pub use config::ConfigStore;
pub use event_sink::EventSink;
pub use player::{AudioPlayer, PlaybackCompletion, PlaybackOutcome, PlayerError, PlayerHandle};
pub use recorder::{AudioRecorder, RecorderHandle, RecordingError, RecordingInterruption};
pub use transcoder::{TranscodeError, Transcoder};
