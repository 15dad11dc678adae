//! Playback/recording state machine

use std::fmt;

use thiserror::Error;

/// Voice states.
///
/// Numeric values are sent as the value of STATE events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VoiceState {
    #[default]
    None = 0,
    Starting = 1,
    Running = 2,
    Paused = 3,
    Stopped = 4,
}

impl VoiceState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    /// Get the numeric wire value
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: VoiceState,
    pub action: String,
}

/// Playback lifecycle of a single player handle.
///
/// State machine:
///   NONE -> STARTING (begin_start)
///   STARTING -> RUNNING (running)
///   PAUSED -> RUNNING (running, resume)
///   RUNNING -> PAUSED (pause)
///   any -> STOPPED (stop, completion or failure)
#[derive(Debug, Default)]
pub struct PlaybackSession {
    state: VoiceState,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            state: VoiceState::None,
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == VoiceState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == VoiceState::Paused
    }

    /// Transition from NONE to STARTING
    pub fn begin_start(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != VoiceState::None {
            return Err(self.invalid("start"));
        }
        self.state = VoiceState::Starting;
        Ok(())
    }

    /// Transition to RUNNING once the native player acknowledged playback
    pub fn running(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            VoiceState::Starting | VoiceState::Paused | VoiceState::Running => {
                self.state = VoiceState::Running;
                Ok(())
            }
            _ => Err(self.invalid("run")),
        }
    }

    /// Transition from RUNNING to PAUSED
    pub fn pause(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            VoiceState::Running | VoiceState::Paused => {
                self.state = VoiceState::Paused;
                Ok(())
            }
            _ => Err(self.invalid("pause")),
        }
    }

    /// Any state may be stopped
    pub fn stop(&mut self) {
        self.state = VoiceState::Stopped;
    }

    fn invalid(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.state,
            action: action.to_string(),
        }
    }
}
