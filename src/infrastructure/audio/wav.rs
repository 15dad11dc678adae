//! WAV file reading and writing with hound

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use thiserror::Error;

use super::resample::downmix;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("Cannot open {path}: {message}")]
    Open { path: String, message: String },

    #[error("Unsupported WAV format: {0}")]
    Unsupported(String),

    #[error("Corrupt WAV data: {0}")]
    Corrupt(String),

    #[error("Cannot write {path}: {message}")]
    Write { path: String, message: String },
}

/// Read a WAV file as mono 16-bit PCM.
///
/// Integer formats of any width are rescaled to 16 bits; 32-bit float is
/// accepted. Returns the samples and their sample rate.
pub fn read_wav_mono(path: &Path) -> Result<(Vec<i16>, u32), WavError> {
    let reader = WavReader::open(path).map_err(|e| WavError::Open {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let spec = reader.spec();

    let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .collect::<Result<_, _>>()
            .map_err(|e| WavError::Corrupt(e.to_string()))?,
        (SampleFormat::Int, bits) if bits <= 32 => {
            let shift = i32::from(bits) - 16;
            reader
                .into_samples::<i32>()
                .map(|s| {
                    s.map(|v| {
                        if shift >= 0 {
                            (v >> shift) as i16
                        } else {
                            (v << -shift) as i16
                        }
                    })
                })
                .collect::<Result<_, _>>()
                .map_err(|e| WavError::Corrupt(e.to_string()))?
        }
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0) as i16))
            .collect::<Result<_, _>>()
            .map_err(|e| WavError::Corrupt(e.to_string()))?,
        (format, bits) => {
            return Err(WavError::Unsupported(format!("{:?} {}-bit", format, bits)));
        }
    };

    Ok((downmix(&interleaved, spec.channels), spec.sample_rate))
}

/// Write mono 16-bit PCM
pub fn write_wav_mono(path: &Path, samples: &[i16], sample_rate: u32) -> Result<(), WavError> {
    let write_err = |e: hound::Error| WavError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(write_err)?;
    }
    writer.finalize().map_err(write_err)
}
