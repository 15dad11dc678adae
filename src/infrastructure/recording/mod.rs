//! Recording infrastructure module
//!
//! Cross-platform capture with cpal, written out as linear PCM WAV.

mod cpal_recorder;

pub use cpal_recorder::{CpalRecorder, CpalRecordingHandle};
