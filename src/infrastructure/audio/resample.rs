//! Channel mixing and sample-rate conversion

use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

const CHUNK_SIZE: usize = 1024;

#[derive(Debug, Clone, Error)]
pub enum ResampleError {
    #[error("Resampler init failed: {0}")]
    Init(String),

    #[error("Resampling failed: {0}")]
    Process(String),
}

/// Average interleaved channels down to mono
pub fn downmix(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Resample mono PCM from `source_rate` to `target_rate`.
///
/// The output has exactly `ceil(len * target / source)` samples.
pub fn resample(samples: &[i16], source_rate: u32, target_rate: u32) -> Result<Vec<i16>, ResampleError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        2, // Sub-chunks
        1, // Mono
    )
    .map_err(|e| ResampleError::Init(e.to_string()))?;

    let mut output = Vec::with_capacity(output_len + CHUNK_SIZE);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());

        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        chunk.resize(frames_needed, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| ResampleError::Process(e.to_string()))?;

        output.extend(
            resampled[0]
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16),
        );
        input_pos = end_pos;
    }

    output.resize(output_len, 0);
    Ok(output)
}
