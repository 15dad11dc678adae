//! Recording port interfaces

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::VoiceError;
use crate::domain::recording::{PowerReading, RecorderSettings};

/// Recording errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("Recording failed: {0}")]
    RecordingFailed(String),

    #[error("Failed to write audio file: {0}")]
    WriteFailed(String),

    #[error("No audio device available")]
    NoAudioDevice,
}

impl From<RecordingError> for VoiceError {
    fn from(err: RecordingError) -> Self {
        VoiceError::aborted(err.to_string())
    }
}

/// Continuation invoked at most once if the input stream dies while recording
pub type RecordingInterruption = Box<dyn FnOnce(String) + Send>;

/// Port for starting native recorders
#[async_trait]
pub trait AudioRecorder: Send + Sync {
    /// Start recording linear PCM destined for `target`.
    ///
    /// # Arguments
    /// * `target` - WAV file written when the handle is stopped
    /// * `settings` - PCM profile of the written file
    /// * `on_interrupt` - Continuation for stream failures
    async fn start(
        &self,
        target: &Path,
        settings: RecorderSettings,
        on_interrupt: RecordingInterruption,
    ) -> Result<Box<dyn RecorderHandle>, RecordingError>;
}

/// A live native recorder
#[async_trait]
pub trait RecorderHandle: Send + Sync {
    /// Stop capturing and finalise the WAV file.
    /// Calling it on a stopped handle is a no-op.
    async fn stop(&mut self) -> Result<(), RecordingError>;

    /// Latest input level
    fn power(&self) -> PowerReading;

    /// Check if currently capturing
    fn is_recording(&self) -> bool;

    /// Get elapsed recording time in milliseconds
    fn elapsed_ms(&self) -> u64;
}
