//! Domain error types

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes reported to bridge callers.
///
/// The numeric values are part of the wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum VoiceErrorCode {
    /// Unknown or uninitialized resource id, or an interrupted operation
    Aborted = 1,
    /// Remote playback resource could not be fetched
    Network = 2,
    /// Codec or transcoder rejected the resource
    Decode = 3,
    /// No playable resource found at validation time
    NoneSupported = 4,
}

impl VoiceErrorCode {
    /// Get the numeric wire value
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Get the symbolic name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aborted => "VOICE_ERR_ABORTED",
            Self::Network => "VOICE_ERR_NETWORK",
            Self::Decode => "VOICE_ERR_DECODE",
            Self::NoneSupported => "VOICE_ERR_NONE_SUPPORTED",
        }
    }
}

impl fmt::Display for VoiceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<VoiceErrorCode> for u8 {
    fn from(code: VoiceErrorCode) -> Self {
        code.as_u8()
    }
}

impl TryFrom<u8> for VoiceErrorCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Aborted),
            2 => Ok(Self::Network),
            3 => Ok(Self::Decode),
            4 => Ok(Self::NoneSupported),
            other => Err(format!("unknown voice error code: {}", other)),
        }
    }
}

/// Error reported to the caller, either as an ERROR event or an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct VoiceError {
    pub code: VoiceErrorCode,
    pub message: String,
}

impl VoiceError {
    pub fn new(code: VoiceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(VoiceErrorCode::Aborted, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(VoiceErrorCode::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(VoiceErrorCode::Decode, message)
    }

    pub fn none_supported(message: impl Into<String>) -> Self {
        Self::new(VoiceErrorCode::NoneSupported, message)
    }

    /// Error for an operation that targets a resource id with no session
    pub fn unknown_resource(id: &str) -> Self {
        Self::aborted(format!("Unknown resource: {}", id))
    }
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
