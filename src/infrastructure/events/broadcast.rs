//! Fan-out event sink over a tokio broadcast channel

use tokio::sync::broadcast;
use tracing::trace;

use crate::application::ports::EventSink;
use crate::domain::voice::VoiceEvent;

/// Events buffered per subscriber before the slowest one starts lagging
pub const EVENT_CAPACITY: usize = 1024;

/// Delivers every event to all current subscribers.
/// Events emitted with no subscriber are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<VoiceEvent>,
}

impl BroadcastEventSink {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoiceEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: VoiceEvent) {
        trace!(id = %event.id, msg_type = ?event.msg_type, "Event");
        let _ = self.sender.send(event);
    }
}
