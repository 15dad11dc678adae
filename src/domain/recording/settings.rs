//! Fixed recorder settings profile

/// Sample rate of AMR-NB speech, used for every recording
pub const SPEECH_SAMPLE_RATE: u32 = 8000;

/// Linear PCM profile the recorder writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderSettings {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl RecorderSettings {
    /// 8kHz mono 16-bit linear PCM, directly transcodable to AMR-NB
    pub const fn speech() -> Self {
        Self {
            sample_rate: SPEECH_SAMPLE_RATE,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    /// Bytes of PCM produced per second
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * (self.bits_per_sample as u32 / 8)
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self::speech()
    }
}
