//! WAV <-> AMR transcoder
//!
//! Encoding reads any PCM WAV, mixes it to mono and resamples to 8 kHz,
//! then emits one 20 ms frame per 160 samples (the last one zero-padded).
//! Decoding writes 8 kHz mono 16-bit WAV. SID and NO_DATA frames decode
//! to silence.

mod amr;
mod speech_codec;

use std::marker::PhantomData;
use std::path::Path;

use tracing::debug;

pub use amr::{parse_frames, AmrError, AmrFrame, AmrWriter, FrameType, MAGIC, SAMPLES_PER_FRAME, SAMPLE_RATE};
pub use speech_codec::{AdpcmSpeechCodec, CodecError, SpeechCodec};

use super::audio::{read_wav_mono, resample, write_wav_mono, WavError};
use crate::application::ports::{TranscodeError, Transcoder};

/// File transcoder built on a [`SpeechCodec`]
pub struct AmrTranscoder<C = AdpcmSpeechCodec> {
    codec: PhantomData<fn() -> C>,
}

impl AmrTranscoder {
    pub fn new() -> Self {
        Self::with_codec()
    }
}

impl Default for AmrTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: SpeechCodec + Default> AmrTranscoder<C> {
    pub fn with_codec() -> Self {
        Self { codec: PhantomData }
    }

    /// Encode 8 kHz mono PCM into an AMR file image
    pub fn encode_pcm(&self, samples: &[i16]) -> Vec<u8> {
        let mut codec = C::default();
        let mut writer = AmrWriter::new();
        let frame_type = codec.frame_type();

        for chunk in samples.chunks(SAMPLES_PER_FRAME) {
            let mut frame = [0i16; SAMPLES_PER_FRAME];
            frame[..chunk.len()].copy_from_slice(chunk);
            writer.push(frame_type, &codec.encode(&frame));
        }
        writer.into_bytes()
    }

    /// Decode an AMR file image to 8 kHz mono PCM
    pub fn decode_bytes(&self, data: &[u8]) -> Result<Vec<i16>, TranscodeError> {
        let frames = parse_frames(data).map_err(|e| TranscodeError::Format(e.to_string()))?;
        let mut codec = C::default();
        let mut pcm = Vec::with_capacity(frames.len() * SAMPLES_PER_FRAME);

        for frame in frames {
            match frame.frame_type {
                FrameType::Sid | FrameType::NoData => {
                    pcm.extend_from_slice(&[0i16; SAMPLES_PER_FRAME]);
                }
                frame_type => {
                    let decoded = codec
                        .decode(frame_type, frame.payload)
                        .map_err(|e| TranscodeError::Codec(e.to_string()))?;
                    pcm.extend_from_slice(&decoded);
                }
            }
        }
        Ok(pcm)
    }
}

impl<C: SpeechCodec + Default> Transcoder for AmrTranscoder<C> {
    fn amr_to_wav(&self, amr: &Path, wav: &Path) -> Result<(), TranscodeError> {
        let data = std::fs::read(amr)
            .map_err(|e| TranscodeError::Read(format!("{}: {}", amr.display(), e)))?;
        let pcm = self.decode_bytes(&data)?;
        write_wav_mono(wav, &pcm, SAMPLE_RATE).map_err(from_wav_error)?;

        debug!(
            amr = %amr.display(),
            wav = %wav.display(),
            samples = pcm.len(),
            "Decoded AMR"
        );
        Ok(())
    }

    fn wav_to_amr(&self, wav: &Path, amr: &Path) -> Result<(), TranscodeError> {
        let (samples, rate) = read_wav_mono(wav).map_err(from_wav_error)?;
        let speech = resample(&samples, rate, SAMPLE_RATE)
            .map_err(|e| TranscodeError::Codec(e.to_string()))?;
        let bytes = self.encode_pcm(&speech);
        std::fs::write(amr, &bytes)
            .map_err(|e| TranscodeError::Write(format!("{}: {}", amr.display(), e)))?;

        debug!(
            wav = %wav.display(),
            amr = %amr.display(),
            source_rate = rate,
            bytes = bytes.len(),
            "Encoded AMR"
        );
        Ok(())
    }
}

fn from_wav_error(err: WavError) -> TranscodeError {
    let message = err.to_string();
    match err {
        WavError::Open { .. } => TranscodeError::Read(message),
        WavError::Unsupported(_) | WavError::Corrupt(_) => TranscodeError::Format(message),
        WavError::Write { .. } => TranscodeError::Write(message),
    }
}
