//! JSON-lines wire format for the bridge socket

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::voice::{BridgeReply, EventValue, MsgType, VoiceEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// One line written to a connected client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    #[serde(rename_all = "camelCase")]
    Reply {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        callback_id: Option<String>,
        status: ReplyStatus,
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    Event {
        id: String,
        msg_type: MsgType,
        value: EventValue,
    },
}

impl OutboundMessage {
    pub fn reply(callback_id: Option<String>, reply: &BridgeReply) -> Self {
        let (status, value) = match reply {
            BridgeReply::Ack => (ReplyStatus::Ok, Value::Null),
            BridgeReply::Number(n) => (ReplyStatus::Ok, json!(n)),
            BridgeReply::Power(p) => (
                ReplyStatus::Ok,
                json!({ "average": p.average, "peak": p.peak }),
            ),
            BridgeReply::Error(e) => (
                ReplyStatus::Error,
                serde_json::to_value(e).unwrap_or(Value::Null),
            ),
        };
        Self::Reply {
            callback_id,
            status,
            value,
        }
    }

    /// Reply for a line that was not a valid request
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Reply {
            callback_id: None,
            status: ReplyStatus::Error,
            value: json!({ "code": 1, "message": message.into() }),
        }
    }

    /// Last line sent to a session that missed `skipped` events
    pub fn lagged(skipped: u64) -> Self {
        Self::Reply {
            callback_id: None,
            status: ReplyStatus::Error,
            value: json!({
                "code": 1,
                "message": format!("Session lagged, {} events dropped; reconnect to resync", skipped),
            }),
        }
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply { .. })
    }

    /// Serialize as a single newline-terminated line
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

impl From<VoiceEvent> for OutboundMessage {
    fn from(event: VoiceEvent) -> Self {
        Self::Event {
            id: event.id,
            msg_type: event.msg_type,
            value: event.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::VoiceError;
    use crate::domain::recording::PowerReading;
    use crate::domain::voice::VoiceState;

    #[test]
    fn ack_reply_shape() {
        let msg = OutboundMessage::reply(Some("cb1".into()), &BridgeReply::Ack);
        let json: Value = serde_json::from_str(&msg.to_line().unwrap()).unwrap();
        assert_eq!(json["type"], "reply");
        assert_eq!(json["callbackId"], "cb1");
        assert_eq!(json["status"], "ok");
        assert!(json["value"].is_null());
    }

    #[test]
    fn error_reply_carries_code() {
        let reply = BridgeReply::Error(VoiceError::aborted("unknown id"));
        let msg = OutboundMessage::reply(None, &reply);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["value"]["code"], 1);
        assert!(json.get("callbackId").is_none());
    }

    #[test]
    fn power_reply_is_an_object() {
        let reply = BridgeReply::Power(PowerReading {
            average: -30.0,
            peak: -12.0,
        });
        let json = serde_json::to_value(OutboundMessage::reply(None, &reply)).unwrap();
        assert_eq!(json["value"]["average"], -30.0);
        assert_eq!(json["value"]["peak"], -12.0);
    }

    #[test]
    fn event_shape_matches_voice_event() {
        let msg = OutboundMessage::from(VoiceEvent::state("clip1", VoiceState::Stopped));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["id"], "clip1");
        assert_eq!(json["msgType"], 1);
        assert_eq!(json["value"], 4.0);
    }

    #[test]
    fn lagged_notice_is_an_uncorrelated_error() {
        let json = serde_json::to_value(OutboundMessage::lagged(12)).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json.get("callbackId").is_none());
        assert!(json["value"]["message"].as_str().unwrap().contains("12 events"));
    }

    #[test]
    fn lines_parse_back() {
        let msg = OutboundMessage::from(VoiceEvent::duration("a", 2.5));
        let line = msg.to_line().unwrap();
        assert!(line.ends_with('\n'));
        let parsed: OutboundMessage = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed, msg);
        assert!(!parsed.is_reply());
    }
}
