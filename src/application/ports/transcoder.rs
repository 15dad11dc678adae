//! Transcoder port interface

use std::path::Path;

use thiserror::Error;

/// Transcoding failures. Each variant has a stable nonzero status code.
#[derive(Debug, Clone, Error)]
pub enum TranscodeError {
    #[error("Resource has no local file: {0}")]
    NoLocalPath(String),

    #[error("Failed to read {0}")]
    Read(String),

    #[error("Invalid container: {0}")]
    Format(String),

    #[error("Codec failure: {0}")]
    Codec(String),

    #[error("Failed to write {0}")]
    Write(String),
}

impl TranscodeError {
    /// Status code, 0 being reserved for success
    pub const fn code(&self) -> i32 {
        match self {
            Self::NoLocalPath(_) => 1,
            Self::Read(_) => 2,
            Self::Format(_) => 3,
            Self::Codec(_) => 4,
            Self::Write(_) => 5,
        }
    }
}

/// Port for converting between WAV (linear PCM) and AMR (compressed speech).
///
/// Both directions are synchronous and blocking.
pub trait Transcoder: Send + Sync {
    fn amr_to_wav(&self, amr: &Path, wav: &Path) -> Result<(), TranscodeError>;

    fn wav_to_amr(&self, wav: &Path, amr: &Path) -> Result<(), TranscodeError>;
}
