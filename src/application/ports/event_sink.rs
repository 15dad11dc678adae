//! Outbound event port

use crate::domain::voice::VoiceEvent;

/// Port for pushing status events back to bridge callers.
///
/// `emit` must not block; it is called while the handle cache is locked
/// and from native callback contexts.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: VoiceEvent);
}
