//! Audio session port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::error::VoiceError;
use crate::domain::voice::OutputRoute;

/// What the session is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCategory {
    Playback,
    Record,
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Audio session unavailable: {0}")]
    Unavailable(String),

    #[error("Cannot configure audio session for {category:?}: {message}")]
    Configure {
        category: SessionCategory,
        message: String,
    },

    #[error("No output for route {route}: {message}")]
    Route { route: OutputRoute, message: String },
}

impl From<SessionError> for VoiceError {
    fn from(err: SessionError) -> Self {
        VoiceError::aborted(err.to_string())
    }
}

/// Port for the platform audio session
#[async_trait]
pub trait AudioSession: Send + Sync {
    /// Acquire the session; called once per process
    async fn acquire(&self) -> Result<(), SessionError>;

    /// Configure the session category before a playback or recording start
    async fn configure(&self, category: SessionCategory) -> Result<(), SessionError>;

    /// Select the playback output; players opened afterwards use it
    async fn set_output_route(&self, route: OutputRoute) -> Result<(), SessionError>;

    fn output_route(&self) -> OutputRoute;
}
