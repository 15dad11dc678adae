//! PCM helpers shared by the recorder and the transcoder

mod resample;
mod wav;

pub use resample::{downmix, resample, ResampleError};
pub use wav::{read_wav_mono, write_wav_mono, WavError};
