//! Recording domain module

mod power;
mod settings;

pub use power::{amplitude_to_db, PowerReading, MIN_POWER_DB};
pub use settings::{RecorderSettings, SPEECH_SAMPLE_RATE};
