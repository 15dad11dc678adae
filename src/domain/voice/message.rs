//! Outbound status messages

use serde::{Deserialize, Serialize};

use super::state::VoiceState;
use crate::domain::error::VoiceError;

/// Message types carried by outbound events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MsgType {
    State = 1,
    Duration = 2,
    Position = 3,
    Power = 4,
    Error = 9,
}

impl From<MsgType> for u8 {
    fn from(msg: MsgType) -> Self {
        msg as u8
    }
}

impl TryFrom<u8> for MsgType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        match value {
            1 => Ok(Self::State),
            2 => Ok(Self::Duration),
            3 => Ok(Self::Position),
            4 => Ok(Self::Power),
            9 => Ok(Self::Error),
            other => Err(format!("unknown message type: {}", other)),
        }
    }
}

/// Event payload: a number, or an error object for ERROR events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Number(f64),
    Error(VoiceError),
}

/// A status event pushed to the caller for one resource id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceEvent {
    pub id: String,
    pub msg_type: MsgType,
    pub value: EventValue,
}

impl VoiceEvent {
    pub fn state(id: &str, state: VoiceState) -> Self {
        Self {
            id: id.to_string(),
            msg_type: MsgType::State,
            value: EventValue::Number(f64::from(state.as_u8())),
        }
    }

    /// Duration in seconds
    pub fn duration(id: &str, seconds: f64) -> Self {
        Self {
            id: id.to_string(),
            msg_type: MsgType::Duration,
            value: EventValue::Number(seconds),
        }
    }

    /// Position in seconds
    pub fn position(id: &str, seconds: f64) -> Self {
        Self {
            id: id.to_string(),
            msg_type: MsgType::Position,
            value: EventValue::Number(seconds),
        }
    }

    /// Power in dBFS
    pub fn power(id: &str, decibels: f64) -> Self {
        Self {
            id: id.to_string(),
            msg_type: MsgType::Power,
            value: EventValue::Number(decibels),
        }
    }

    pub fn error(id: &str, error: VoiceError) -> Self {
        Self {
            id: id.to_string(),
            msg_type: MsgType::Error,
            value: EventValue::Error(error),
        }
    }

    /// The state carried by a STATE event
    pub fn as_state(&self) -> Option<VoiceState> {
        if self.msg_type != MsgType::State {
            return None;
        }
        match self.value {
            EventValue::Number(n) => match n as u8 {
                0 => Some(VoiceState::None),
                1 => Some(VoiceState::Starting),
                2 => Some(VoiceState::Running),
                3 => Some(VoiceState::Paused),
                4 => Some(VoiceState::Stopped),
                _ => None,
            },
            EventValue::Error(_) => None,
        }
    }

    /// The error carried by an ERROR event
    pub fn as_error(&self) -> Option<&VoiceError> {
        match &self.value {
            EventValue::Error(e) => Some(e),
            EventValue::Number(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::VoiceErrorCode;

    #[test]
    fn state_event_json_shape() {
        let event = VoiceEvent::state("clip1", VoiceState::Running);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], "clip1");
        assert_eq!(json["msgType"], 1);
        assert_eq!(json["value"], 2.0);
    }

    #[test]
    fn error_event_json_shape() {
        let event = VoiceEvent::error("clip1", VoiceError::decode("bad frame"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["msgType"], 9);
        assert_eq!(json["value"]["code"], 3);
        assert_eq!(json["value"]["message"], "bad frame");
    }

    #[test]
    fn error_event_parses_back() {
        let line = r#"{"id":"a","msgType":9,"value":{"code":2,"message":"x"}}"#;
        let event: VoiceEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.as_error().unwrap().code, VoiceErrorCode::Network);
    }

    #[test]
    fn as_state_only_for_state_events() {
        assert_eq!(
            VoiceEvent::state("a", VoiceState::Paused).as_state(),
            Some(VoiceState::Paused)
        );
        assert_eq!(VoiceEvent::position("a", 3.0).as_state(), None);
    }
}
