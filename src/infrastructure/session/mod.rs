//! Audio session adapters

mod cpal_session;

pub use cpal_session::{pick_earpiece, CpalAudioSession, OutputSelection};
