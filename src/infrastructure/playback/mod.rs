//! Playback infrastructure module
//!
//! Native players built on rodio. Remote sources are downloaded with
//! reqwest before decoding.

mod fetch;
mod rodio_player;

pub use fetch::fetch_remote;
pub use rodio_player::{RodioPlayer, RodioPlayerHandle};
