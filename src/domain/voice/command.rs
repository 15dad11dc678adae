//! Inbound bridge commands and their replies

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::error::VoiceError;
use crate::domain::recording::PowerReading;

use super::route::OutputRoute;

/// Raw inbound request as delivered by the bridge transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl BridgeRequest {
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            callback_id: None,
            method: method.into(),
            args,
        }
    }
}

/// Caller options for starting playback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackOptions {
    /// Override the configured playback validation
    #[serde(default)]
    pub validate: Option<bool>,
}

/// A parsed bridge command
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCommand {
    Create { id: String, source: String },
    StartRecording { id: String, source: Option<String> },
    StopRecording { id: String },
    StartPlaying { id: String, source: Option<String>, options: PlaybackOptions },
    PausePlaying { id: String },
    StopPlaying { id: String },
    SeekTo { id: String, milliseconds: u64 },
    GetCurrentPosition { id: String },
    GetDuration { id: String },
    GetPower { id: String },
    SetVolume { id: String, level: f32 },
    Release { id: String },
    SetOutputRoute { route: OutputRoute },
    GetOutputRoute,
    Reset,
    SuspendAll,
    ResumeAll,
}

/// Error when a request cannot be turned into a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("{method}: missing argument #{index}")]
    MissingArgument { method: String, index: usize },

    #[error("{method}: invalid argument #{index}: {message}")]
    InvalidArgument {
        method: String,
        index: usize,
        message: String,
    },
}

impl From<CommandParseError> for VoiceError {
    fn from(err: CommandParseError) -> Self {
        VoiceError::aborted(err.to_string())
    }
}

impl TryFrom<&BridgeRequest> for BridgeCommand {
    type Error = CommandParseError;

    fn try_from(req: &BridgeRequest) -> Result<Self, Self::Error> {
        let args = Args {
            method: &req.method,
            values: &req.args,
        };

        let command = match req.method.as_str() {
            "create" => Self::Create {
                id: args.string(0)?,
                source: args.string(1)?,
            },
            "startRecordingAudio" | "startRecording" => Self::StartRecording {
                id: args.string(0)?,
                source: args.opt_string(1)?,
            },
            "stopRecordingAudio" | "stopRecording" => Self::StopRecording { id: args.string(0)? },
            "startPlayingAudio" | "startPlaying" => Self::StartPlaying {
                id: args.string(0)?,
                source: args.opt_string(1)?,
                options: args.options(2)?,
            },
            "pausePlayingAudio" | "pausePlaying" => Self::PausePlaying { id: args.string(0)? },
            "stopPlayingAudio" | "stopPlaying" => Self::StopPlaying { id: args.string(0)? },
            "seekToAudio" | "seekTo" => Self::SeekTo {
                id: args.string(0)?,
                milliseconds: args.number(1)?.max(0.0) as u64,
            },
            "getCurrentPositionAudio" | "getCurrentPosition" => {
                Self::GetCurrentPosition { id: args.string(0)? }
            }
            "getDurationAudio" | "getDuration" => Self::GetDuration { id: args.string(0)? },
            "getPower" => Self::GetPower { id: args.string(0)? },
            "setVolume" => Self::SetVolume {
                id: args.string(0)?,
                level: args.number(1)? as f32,
            },
            "release" => Self::Release { id: args.string(0)? },
            "setVoiceOutputDevice" | "setOutputRoute" => Self::SetOutputRoute {
                route: args.route(0)?,
            },
            "getVoiceOutputDevice" | "getOutputRoute" => Self::GetOutputRoute,
            "reset" => Self::Reset,
            "suspendAll" => Self::SuspendAll,
            "resumeAll" => Self::ResumeAll,
            other => return Err(CommandParseError::UnknownMethod(other.to_string())),
        };

        Ok(command)
    }
}

/// Positional argument accessor
struct Args<'a> {
    method: &'a str,
    values: &'a [Value],
}

impl Args<'_> {
    fn missing(&self, index: usize) -> CommandParseError {
        CommandParseError::MissingArgument {
            method: self.method.to_string(),
            index,
        }
    }

    fn invalid(&self, index: usize, message: &str) -> CommandParseError {
        CommandParseError::InvalidArgument {
            method: self.method.to_string(),
            index,
            message: message.to_string(),
        }
    }

    fn string(&self, index: usize) -> Result<String, CommandParseError> {
        self.opt_string(index)?.ok_or_else(|| self.missing(index))
    }

    fn opt_string(&self, index: usize) -> Result<Option<String>, CommandParseError> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(self.invalid(index, "expected a string")),
        }
    }

    /// Numbers may arrive as JSON numbers or numeric strings
    fn number(&self, index: usize) -> Result<f64, CommandParseError> {
        match self.values.get(index) {
            None | Some(Value::Null) => Err(self.missing(index)),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| self.invalid(index, "number out of range")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.invalid(index, "expected a number")),
            Some(_) => Err(self.invalid(index, "expected a number")),
        }
    }

    fn route(&self, index: usize) -> Result<OutputRoute, CommandParseError> {
        OutputRoute::from_code(self.number(index)?)
            .ok_or_else(|| self.invalid(index, "expected 1 (earpiece) or 2 (speaker)"))
    }

    fn options(&self, index: usize) -> Result<PlaybackOptions, CommandParseError> {
        match self.values.get(index) {
            None | Some(Value::Null) => Ok(PlaybackOptions::default()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| self.invalid(index, &e.to_string())),
        }
    }
}

/// Immediate reply to an inbound command
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeReply {
    /// Accepted; the outcome arrives as events
    Ack,
    /// A scalar result: seconds for position and duration, a code for the output route
    Number(f64),
    Power(PowerReading),
    Error(VoiceError),
}

impl BridgeReply {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn error(&self) -> Option<&VoiceError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }
}
