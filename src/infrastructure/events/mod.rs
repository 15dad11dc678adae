//! Event sink adapters

mod broadcast;

pub use broadcast::BroadcastEventSink;
