//! Playback port interfaces

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::VoiceError;
use crate::domain::voice::ResourceUrl;

/// Playback errors reported by the native player
#[derive(Debug, Clone, Error)]
pub enum PlayerError {
    #[error("Failed to fetch remote audio: {0}")]
    Network(String),

    #[error("Audio source not found: {0}")]
    NotFound(String),

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("No audio output device available: {0}")]
    Device(String),

    #[error("Player failed: {0}")]
    Failed(String),
}

impl From<PlayerError> for VoiceError {
    fn from(err: PlayerError) -> Self {
        let message = err.to_string();
        match err {
            PlayerError::Network(_) => VoiceError::network(message),
            PlayerError::NotFound(_) => VoiceError::none_supported(message),
            PlayerError::Decode(_) => VoiceError::decode(message),
            PlayerError::Device(_) | PlayerError::Failed(_) => VoiceError::aborted(message),
        }
    }
}

/// How a playback session ended without being stopped by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Reached the end of the source
    Finished,
    /// The decoder failed mid-stream
    DecodeFailed(String),
    /// Output device lost or playback interrupted
    Interrupted(String),
}

/// Completion continuation registered when a player handle is opened.
/// Invoked at most once, from the player's own thread; never invoked
/// after the handle was stopped by the caller.
pub type PlaybackCompletion = Box<dyn FnOnce(PlaybackOutcome) + Send>;

/// Port for constructing native players
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Open a player bound to `url`, paused at position zero.
    ///
    /// # Arguments
    /// * `url` - Local file or remote URL to play
    /// * `volume` - Initial volume, 0.0 to 1.0
    /// * `on_complete` - Continuation for natural completion or failure
    async fn open(
        &self,
        url: &ResourceUrl,
        volume: f32,
        on_complete: PlaybackCompletion,
    ) -> Result<Box<dyn PlayerHandle>, PlayerError>;
}

/// A live native player
pub trait PlayerHandle: Send + Sync {
    /// Begin or resume playback
    fn play(&self) -> Result<(), PlayerError>;

    fn pause(&self) -> Result<(), PlayerError>;

    /// Stop and rewind; the completion continuation is dropped uncalled
    fn stop(&self);

    fn seek(&self, position: Duration) -> Result<(), PlayerError>;

    fn set_volume(&self, volume: f32);

    /// Current position, if defined
    fn position(&self) -> Option<Duration>;

    /// Total duration, if known
    fn duration(&self) -> Option<Duration>;
}
