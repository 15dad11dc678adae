//! Cross-platform audio recorder using cpal
//!
//! Captures the default input device at its native rate, then on stop:
//! - Mixes down to mono
//! - Resamples to the configured rate
//! - Writes 16-bit linear PCM WAV

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex as StdMutex};
use std::time::Instant;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tokio::time::Duration as TokioDuration;
use tracing::{debug, warn};

use crate::application::ports::{
    AudioRecorder, RecorderHandle, RecordingError, RecordingInterruption,
};
use crate::domain::recording::{PowerReading, RecorderSettings};
use crate::infrastructure::audio::{downmix, resample, write_wav_mono};

/// Shared between the capture thread, the stream callbacks and the handle
struct CaptureState {
    /// Recorded audio samples (mono, i16, at device sample rate)
    buffer: StdMutex<Vec<i16>>,
    device_sample_rate: AtomicU32,
    is_recording: AtomicBool,
    elapsed_ms: AtomicU64,
    power: StdMutex<PowerReading>,
    on_interrupt: StdMutex<Option<RecordingInterruption>>,
}

impl CaptureState {
    fn new(on_interrupt: RecordingInterruption) -> Self {
        Self {
            buffer: StdMutex::new(Vec::new()),
            device_sample_rate: AtomicU32::new(0),
            is_recording: AtomicBool::new(true),
            elapsed_ms: AtomicU64::new(0),
            power: StdMutex::new(PowerReading::silent()),
            on_interrupt: StdMutex::new(Some(on_interrupt)),
        }
    }

    fn push(&self, mono: &[i16]) {
        if !self.is_recording.load(Ordering::SeqCst) {
            return;
        }
        if let Ok(mut power) = self.power.lock() {
            *power = PowerReading::from_samples(mono);
        }
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.extend_from_slice(mono);
        }
    }

    fn interrupt(&self, message: String) {
        let hook = self.on_interrupt.lock().ok().and_then(|mut slot| slot.take());
        if let Some(hook) = hook {
            hook(message);
        }
    }
}

/// Audio recorder using cpal
#[derive(Debug, Default)]
pub struct CpalRecorder;

impl CpalRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Get the default input device
    fn get_input_device() -> Result<cpal::Device, RecordingError> {
        let host = cpal::default_host();
        host.default_input_device()
            .ok_or(RecordingError::NoAudioDevice)
    }

    /// Get a suitable input configuration, preferring mono and `target_rate`
    fn get_input_config(
        device: &cpal::Device,
        target_rate: u32,
    ) -> Result<(StreamConfig, SampleFormat), RecordingError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| RecordingError::StartFailed(format!("Failed to get configs: {}", e)))?;

        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;

        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let includes_target = config.min_sample_rate().0 <= target_rate
                && config.max_sample_rate().0 >= target_rate;

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate =
                        includes_target && current.min_sample_rate().0 > target_rate;
                    fewer_channels || better_rate
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config.ok_or(RecordingError::StartFailed(
            "No suitable config found".into(),
        ))?;

        let sample_rate = if config_range.min_sample_rate().0 <= target_rate
            && config_range.max_sample_rate().0 >= target_rate
        {
            SampleRate(target_rate)
        } else {
            config_range.min_sample_rate()
        };

        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        state: &Arc<CaptureState>,
    ) -> Result<cpal::Stream, RecordingError> {
        let channels = config.channels;
        let error_state = Arc::clone(state);
        let on_error = move |err: cpal::StreamError| {
            warn!(error = %err, "Audio input stream error");
            error_state.interrupt(err.to_string());
        };

        let stream = match sample_format {
            SampleFormat::I16 => {
                let state = Arc::clone(state);
                device.build_input_stream(
                    config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        state.push(&downmix(data, channels));
                    },
                    on_error,
                    None,
                )
            }
            SampleFormat::F32 => {
                let state = Arc::clone(state);
                device.build_input_stream(
                    config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let i16_data: Vec<i16> =
                            data.iter().map(|&s| (s * 32767.0) as i16).collect();
                        state.push(&downmix(&i16_data, channels));
                    },
                    on_error,
                    None,
                )
            }
            _ => {
                return Err(RecordingError::StartFailed(
                    "Unsupported sample format".into(),
                ))
            }
        };

        stream.map_err(|e| RecordingError::StartFailed(e.to_string()))
    }

    /// Capture thread body; reports readiness once the stream is playing
    fn capture(
        state: Arc<CaptureState>,
        target_rate: u32,
        ready: mpsc::Sender<Result<(), RecordingError>>,
    ) {
        let setup = || -> Result<cpal::Stream, RecordingError> {
            let device = Self::get_input_device()?;
            let (config, sample_format) = Self::get_input_config(&device, target_rate)?;
            state
                .device_sample_rate
                .store(config.sample_rate.0, Ordering::SeqCst);
            let stream = Self::build_stream(&device, &config, sample_format, &state)?;
            stream
                .play()
                .map_err(|e| RecordingError::StartFailed(e.to_string()))?;
            Ok(stream)
        };

        let stream = match setup() {
            Ok(stream) => stream,
            Err(e) => {
                state.is_recording.store(false, Ordering::SeqCst);
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        // Keep recording until stopped
        let start = Instant::now();
        while state.is_recording.load(Ordering::SeqCst) {
            state
                .elapsed_ms
                .store(start.elapsed().as_millis() as u64, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        drop(stream);
    }
}

#[async_trait]
impl AudioRecorder for CpalRecorder {
    async fn start(
        &self,
        target: &Path,
        settings: RecorderSettings,
        on_interrupt: RecordingInterruption,
    ) -> Result<Box<dyn RecorderHandle>, RecordingError> {
        let state = Arc::new(CaptureState::new(on_interrupt));
        let (ready_tx, ready_rx) = mpsc::channel();

        // cpal::Stream is not Send, so it lives on its own thread
        let thread_state = Arc::clone(&state);
        let target_rate = settings.sample_rate;
        std::thread::Builder::new()
            .name("voice-recorder".into())
            .spawn(move || CpalRecorder::capture(thread_state, target_rate, ready_tx))
            .map_err(|e| RecordingError::StartFailed(e.to_string()))?;

        tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| RecordingError::StartFailed(format!("Task join error: {}", e)))?
            .map_err(|_| RecordingError::StartFailed("Capture thread exited early".into()))??;

        debug!(
            target = %target.display(),
            device_rate = state.device_sample_rate.load(Ordering::SeqCst),
            "Capture started"
        );

        Ok(Box::new(CpalRecordingHandle {
            state,
            target: target.to_path_buf(),
            settings,
        }))
    }
}

/// A live cpal capture bound to its WAV target
pub struct CpalRecordingHandle {
    state: Arc<CaptureState>,
    target: PathBuf,
    settings: RecorderSettings,
}

#[async_trait]
impl RecorderHandle for CpalRecordingHandle {
    async fn stop(&mut self) -> Result<(), RecordingError> {
        if !self.state.is_recording.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        // Give the thread a moment to clean up
        tokio::time::sleep(TokioDuration::from_millis(100)).await;

        let device_rate = self.state.device_sample_rate.load(Ordering::SeqCst);
        let samples = self
            .state
            .buffer
            .lock()
            .map(|mut buffer| std::mem::take(&mut *buffer))
            .map_err(|_| RecordingError::RecordingFailed("Capture buffer poisoned".into()))?;

        let target = self.target.clone();
        let target_rate = self.settings.sample_rate;

        tokio::task::spawn_blocking(move || {
            let speech = resample(&samples, device_rate, target_rate)
                .map_err(|e| RecordingError::RecordingFailed(e.to_string()))?;
            write_wav_mono(&target, &speech, target_rate)
                .map_err(|e| RecordingError::WriteFailed(e.to_string()))
        })
        .await
        .map_err(|e| RecordingError::RecordingFailed(format!("Encode task error: {}", e)))??;

        debug!(target = %self.target.display(), "Recording written");
        Ok(())
    }

    fn power(&self) -> PowerReading {
        self.state
            .power
            .lock()
            .map(|power| *power)
            .unwrap_or_default()
    }

    fn is_recording(&self) -> bool {
        self.state.is_recording.load(Ordering::SeqCst)
    }

    fn elapsed_ms(&self) -> u64 {
        self.state.elapsed_ms.load(Ordering::SeqCst)
    }
}

impl Drop for CpalRecordingHandle {
    fn drop(&mut self) {
        self.state.is_recording.store(false, Ordering::SeqCst);
    }
}
