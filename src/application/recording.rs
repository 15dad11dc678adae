//! Recording controller

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::error::VoiceError;
use crate::domain::recording::{PowerReading, RecorderSettings};
use crate::domain::voice::{VoiceEvent, VoiceState};

use super::handle_cache::HandleCache;
use super::ports::{
    AudioRecorder, EventSink, RecordingInterruption, SessionCategory, TranscodeError, Transcoder,
};
use super::session::AudioSessionState;
use super::voice_file::RecordingHandle;

/// Drives the native recorder. At most one recorder is live at a time.
pub struct RecordingController {
    cache: Arc<Mutex<HandleCache>>,
    recorder: Arc<dyn AudioRecorder>,
    transcoder: Arc<dyn Transcoder>,
    session: Arc<AudioSessionState>,
    events: Arc<dyn EventSink>,
    settings: RecorderSettings,
}

impl RecordingController {
    pub fn new(
        cache: Arc<Mutex<HandleCache>>,
        recorder: Arc<dyn AudioRecorder>,
        transcoder: Arc<dyn Transcoder>,
        session: Arc<AudioSessionState>,
        events: Arc<dyn EventSink>,
        settings: RecorderSettings,
    ) -> Self {
        Self {
            cache,
            recorder,
            transcoder,
            session,
            events,
            settings,
        }
    }

    /// Start recording `id` into the WAV sibling of its resolved path.
    ///
    /// Any other live recording is stopped first, with its usual STOPPED
    /// event and transcode.
    pub async fn start(&self, id: &str, source: Option<&str>) {
        let source = source.unwrap_or(id);

        let previous: Vec<(String, Option<Finishing>)> = {
            let mut cache = self.cache.lock().await;
            cache
                .recording_ids()
                .into_iter()
                .map(|active| {
                    let finishing = detach(&mut cache, &active);
                    (active, finishing)
                })
                .collect()
        };
        for (active, finishing) in previous {
            info!(previous = %active, next = id, "Stopping active recording");
            self.finish(&active, finishing).await;
        }

        let mut cache = self.cache.lock().await;
        let generation = cache.next_generation();
        let created = match cache.get_or_create(id, source, true, false) {
            Ok((_, created)) => created,
            Err(e) => {
                warn!(id, error = %e, "Cannot resolve recording target");
                self.fail(id, e);
                return;
            }
        };

        if let Err(e) = self.begin(&mut cache, id, generation).await {
            warn!(id, error = %e, "Failed to start recording");
            if created {
                cache.remove(id);
            }
            self.fail(id, e);
        }
    }

    async fn begin(&self, cache: &mut HandleCache, id: &str, generation: u64) -> Result<(), VoiceError> {
        self.session.ensure(SessionCategory::Record).await?;

        let file = cache
            .get_mut(id)
            .ok_or_else(|| VoiceError::unknown_resource(id))?;
        let target = file
            .wav_path()
            .map(|path| path.to_path_buf())
            .ok_or_else(|| VoiceError::none_supported(format!("Cannot record to {}", file.url())))?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                VoiceError::aborted(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        let on_interrupt = self.interruption_hook(id, generation)?;
        let native = self.recorder.start(&target, self.settings, on_interrupt).await?;
        file.recorder = Some(RecordingHandle { generation, native });

        info!(id, target = %target.display(), "Recording started");
        self.events.emit(VoiceEvent::state(id, VoiceState::Running));
        Ok(())
    }

    /// Continuation run when the input stream dies mid-recording
    fn interruption_hook(&self, id: &str, generation: u64) -> Result<RecordingInterruption, VoiceError> {
        let runtime = Handle::try_current()
            .map_err(|e| VoiceError::aborted(format!("No async runtime: {}", e)))?;
        let cache = Arc::clone(&self.cache);
        let events = Arc::clone(&self.events);
        let id = id.to_string();

        Ok(Box::new(move |message| {
            runtime.spawn(async move {
                let detached = cache
                    .lock()
                    .await
                    .get_mut(&id)
                    .and_then(|file| file.take_recorder_if(generation));
                let Some(mut handle) = detached else {
                    debug!(id = %id, generation, "Ignoring interruption of a discarded recorder");
                    return;
                };

                warn!(id = %id, %message, "Recording interrupted");
                if let Err(e) = handle.native.stop().await {
                    warn!(id = %id, error = %e, "Failed to finalise interrupted recording");
                }
                events.emit(VoiceEvent::error(&id, VoiceError::aborted(message)));
                events.emit(VoiceEvent::state(&id, VoiceState::Stopped));
            });
        }))
    }

    pub async fn stop(&self, id: &str) {
        let finishing = {
            let mut cache = self.cache.lock().await;
            if !cache.contains(id) {
                self.events.emit(VoiceEvent::error(id, VoiceError::unknown_resource(id)));
                return;
            }
            detach(&mut cache, id)
        };
        self.finish(id, finishing).await;
    }

    /// Stop a detached recorder, transcode to AMR, emit STOPPED.
    /// Runs without the cache lock.
    async fn finish(&self, id: &str, finishing: Option<Finishing>) {
        if let Some(Finishing { mut handle, paths }) = finishing {
            let elapsed = handle.native.elapsed_ms();
            match handle.native.stop().await {
                Ok(()) => {
                    info!(id, elapsed_ms = elapsed, "Recording stopped");
                    if let Err(e) = self.transcode(paths).await {
                        warn!(id, error = %e, "Failed to encode recording");
                        self.events.emit(VoiceEvent::error(id, e));
                    }
                }
                Err(e) => {
                    warn!(id, error = %e, "Failed to finalise recording");
                    self.events.emit(VoiceEvent::error(id, e.into()));
                }
            }
        }

        self.events.emit(VoiceEvent::state(id, VoiceState::Stopped));
    }

    async fn transcode(&self, paths: Result<(PathBuf, PathBuf), TranscodeError>) -> Result<(), VoiceError> {
        let (wav, amr) = paths.map_err(|e| VoiceError::decode(e.to_string()))?;
        let transcoder = Arc::clone(&self.transcoder);

        tokio::task::spawn_blocking(move || transcoder.wav_to_amr(&wav, &amr))
            .await
            .map_err(|e| VoiceError::aborted(format!("Transcoder task failed: {}", e)))?
            .map_err(|e| VoiceError::decode(format!("{} (status {})", e, e.code())))
    }

    /// Current input level of a live recording; also emitted as POWER
    pub async fn power(&self, id: &str) -> Result<PowerReading, VoiceError> {
        let cache = self.cache.lock().await;
        let file = cache.get(id).ok_or_else(|| VoiceError::unknown_resource(id))?;
        let reading = file
            .recorder
            .as_ref()
            .filter(|handle| handle.native.is_recording())
            .map(|handle| handle.native.power())
            .ok_or_else(|| VoiceError::aborted(format!("{} is not recording", id)))?;

        self.events
            .emit(VoiceEvent::power(id, f64::from(reading.average)));
        Ok(reading)
    }

    fn fail(&self, id: &str, error: VoiceError) {
        self.events.emit(VoiceEvent::error(id, error));
        self.events.emit(VoiceEvent::state(id, VoiceState::Stopped));
    }
}

/// A recorder taken out of the cache together with its transcode paths
struct Finishing {
    handle: RecordingHandle,
    paths: Result<(PathBuf, PathBuf), TranscodeError>,
}

fn detach(cache: &mut HandleCache, id: &str) -> Option<Finishing> {
    let file = cache.get_mut(id)?;
    let handle = file.recorder.take()?;
    Some(Finishing {
        handle,
        paths: file.transcode_paths(),
    })
}
