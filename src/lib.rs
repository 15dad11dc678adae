//! voice-bridge - voice recording and playback bridge
//!
//! Lets script callers manage named voice resources: record from the
//! microphone, play local or remote audio, and convert recordings between
//! WAV and AMR. Commands arrive as JSON lines; outcomes flow back as
//! status events keyed by resource id.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Resource resolution, the playback state machine, wire messages and errors
//! - **Application**: Port traits, the handle cache and the playback/recording controllers
//! - **Infrastructure**: Adapters (rodio playback, cpal capture, AMR transcoder, config store)
//! - **CLI**: Argument parsing, the socket transport and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
