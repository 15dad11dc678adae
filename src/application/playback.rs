//! Playback controller

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::error::VoiceError;
use crate::domain::voice::{PlaybackOptions, PlaybackSession, ResourceUrl, VoiceEvent, VoiceState};

use super::handle_cache::HandleCache;
use super::ports::{
    AudioPlayer, EventSink, PlaybackCompletion, PlaybackOutcome, PlayerHandle, SessionCategory,
    Transcoder,
};
use super::session::AudioSessionState;
use super::voice_file::PlaybackHandle;

/// Drives native players for cached resources and reports progress as events.
pub struct PlaybackController {
    cache: Arc<Mutex<HandleCache>>,
    player: Arc<dyn AudioPlayer>,
    transcoder: Arc<dyn Transcoder>,
    session: Arc<AudioSessionState>,
    events: Arc<dyn EventSink>,
    validate_default: bool,
    /// Ids paused by `suspend_all`, resumed by `resume_all`
    suspended: Mutex<Vec<String>>,
}

impl PlaybackController {
    pub fn new(
        cache: Arc<Mutex<HandleCache>>,
        player: Arc<dyn AudioPlayer>,
        transcoder: Arc<dyn Transcoder>,
        session: Arc<AudioSessionState>,
        events: Arc<dyn EventSink>,
        validate_default: bool,
    ) -> Self {
        Self {
            cache,
            player,
            transcoder,
            session,
            events,
            validate_default,
            suspended: Mutex::new(Vec::new()),
        }
    }

    /// Start or resume playback of `id`.
    ///
    /// Emits STARTING and DURATION for a freshly prepared player, then
    /// RUNNING. Failures emit ERROR then STOPPED and leave no player behind.
    ///
    /// Opening a player may fetch or transcode, so it runs without the cache
    /// lock. The new handle is installed only if no later start, stop or
    /// release for `id` happened meanwhile.
    pub async fn start(&self, id: &str, source: Option<&str>, options: &PlaybackOptions) {
        let source = source.unwrap_or(id);
        let validate = options.validate.unwrap_or(self.validate_default);

        let prepared = {
            let mut cache = self.cache.lock().await;
            match Self::reserve(&mut cache, id, source, validate) {
                Ok(prepared) => prepared,
                Err(e) => {
                    warn!(id, error = %e, "Cannot resolve playback source");
                    self.fail(id, e);
                    return;
                }
            }
        };

        let (opened, created) = match prepared {
            Prepared::Ready => (None, false),
            Prepared::Open(pending) => match self.open(id, &pending).await {
                Ok(native) => {
                    let created = pending.created;
                    (Some((pending, native)), created)
                }
                Err(e) => {
                    warn!(id, error = %e, "Failed to open player");
                    self.abandon(id, &pending).await;
                    self.fail(id, e);
                    return;
                }
            },
        };

        let mut cache = self.cache.lock().await;
        let fresh = opened.is_some();
        if let Some((pending, native)) = opened {
            if !install(&mut cache, id, pending, native) {
                debug!(id, "Discarding player superseded while opening");
                return;
            }
        }

        if let Err(e) = self.begin(&mut cache, id, fresh).await {
            warn!(id, error = %e, "Failed to start playback");
            if let Some(player) = cache.get_mut(id).and_then(|file| file.player.take()) {
                player.native.stop();
            }
            if created {
                cache.remove(id);
            }
            self.fail(id, e);
        }
    }

    /// Resolve `id` and decide whether its current player can be reused.
    /// A new open is reserved under a fresh generation.
    fn reserve(
        cache: &mut HandleCache,
        id: &str,
        source: &str,
        validate: bool,
    ) -> Result<Prepared, VoiceError> {
        let generation = cache.next_generation();
        let (file, created) = cache.get_or_create(id, source, false, validate)?;
        let url = file.url().clone();

        if let Some(handle) = &file.player {
            if handle.source_url == url {
                return Ok(Prepared::Ready);
            }
        }
        if let Some(old) = file.player.take() {
            debug!(id, old = %old.source_url, new = %url, "Source changed, replacing player");
            old.native.stop();
        }

        file.reserve_open(generation);
        Ok(Prepared::Open(PendingOpen {
            generation,
            source_url: url,
            transcode_paths: file.transcode_paths().ok(),
            volume: file.volume(),
            created,
        }))
    }

    /// Open the native player for a reservation. Runs without the cache lock.
    async fn open(&self, id: &str, pending: &PendingOpen) -> Result<Box<dyn PlayerHandle>, VoiceError> {
        let playable = self.playable_url(pending).await?;
        let on_complete = self.completion_hook(id, pending.generation)?;
        let native = self.player.open(&playable, pending.volume, on_complete).await?;
        Ok(native)
    }

    /// Drop a failed reservation, and the entry too if this start created it
    async fn abandon(&self, id: &str, pending: &PendingOpen) {
        let mut cache = self.cache.lock().await;
        let Some(file) = cache.get_mut(id) else {
            return;
        };
        if !file.claim_open(pending.generation) {
            return;
        }
        if pending.created && !file.has_player() && !file.has_recorder() {
            cache.remove(id);
        }
    }

    async fn begin(&self, cache: &mut HandleCache, id: &str, fresh: bool) -> Result<(), VoiceError> {
        let handle = player_mut(cache, id)?;

        if fresh {
            handle
                .session
                .begin_start()
                .map_err(|e| VoiceError::aborted(e.to_string()))?;
            self.events.emit(VoiceEvent::state(id, VoiceState::Starting));
            if let Some(duration) = handle.native.duration() {
                self.events.emit(VoiceEvent::duration(id, duration.as_secs_f64()));
            }
        }

        self.session.ensure(SessionCategory::Playback).await?;
        handle.native.play()?;
        handle
            .session
            .running()
            .map_err(|e| VoiceError::aborted(e.to_string()))?;

        info!(id, url = %handle.source_url, "Playback running");
        self.events.emit(VoiceEvent::state(id, VoiceState::Running));
        Ok(())
    }

    /// Local AMR sources are decoded to their WAV sibling first
    async fn playable_url(&self, pending: &PendingOpen) -> Result<ResourceUrl, VoiceError> {
        let url = &pending.source_url;
        let is_amr = url
            .local_path()
            .and_then(|path| path.extension())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("amr"));
        if !is_amr {
            return Ok(url.clone());
        }

        let (wav, amr) = pending
            .transcode_paths
            .clone()
            .ok_or_else(|| VoiceError::decode(format!("No local paths for {}", url)))?;
        let transcoder = Arc::clone(&self.transcoder);
        let amr_source = amr.clone();
        let wav_target = wav.clone();

        tokio::task::spawn_blocking(move || transcoder.amr_to_wav(&amr_source, &wav_target))
            .await
            .map_err(|e| VoiceError::aborted(format!("Transcoder task failed: {}", e)))?
            .map_err(|e| VoiceError::decode(format!("{} (status {})", e, e.code())))?;

        debug!(amr = %amr.display(), wav = %wav.display(), "Decoded AMR for playback");
        Ok(ResourceUrl::Local(wav))
    }

    /// Continuation run when the native player finishes on its own.
    ///
    /// Only acts if the player identified by `generation` is still attached.
    fn completion_hook(&self, id: &str, generation: u64) -> Result<PlaybackCompletion, VoiceError> {
        let runtime = Handle::try_current()
            .map_err(|e| VoiceError::aborted(format!("No async runtime: {}", e)))?;
        let cache = Arc::clone(&self.cache);
        let events = Arc::clone(&self.events);
        let id = id.to_string();

        Ok(Box::new(move |outcome| {
            runtime.spawn(async move {
                let mut cache = cache.lock().await;
                let finished = cache
                    .get_mut(&id)
                    .and_then(|file| file.take_player_if(generation));
                if finished.is_none() {
                    debug!(id = %id, generation, "Ignoring completion of a discarded player");
                    return;
                }

                match outcome {
                    PlaybackOutcome::Finished => info!(id = %id, "Playback finished"),
                    PlaybackOutcome::DecodeFailed(message) => {
                        warn!(id = %id, %message, "Playback decode failed");
                        events.emit(VoiceEvent::error(&id, VoiceError::decode(message)));
                    }
                    PlaybackOutcome::Interrupted(message) => {
                        warn!(id = %id, %message, "Playback interrupted");
                        events.emit(VoiceEvent::error(&id, VoiceError::aborted(message)));
                    }
                }
                events.emit(VoiceEvent::state(&id, VoiceState::Stopped));
            });
        }))
    }

    pub async fn pause(&self, id: &str) {
        let mut cache = self.cache.lock().await;
        match Self::pause_player(&mut cache, id) {
            Ok(()) => self.events.emit(VoiceEvent::state(id, VoiceState::Paused)),
            Err(e) => self.events.emit(VoiceEvent::error(id, e)),
        }
    }

    fn pause_player(cache: &mut HandleCache, id: &str) -> Result<(), VoiceError> {
        let handle = player_mut(cache, id)?;
        handle.native.pause()?;
        handle
            .session
            .pause()
            .map_err(|e| VoiceError::aborted(e.to_string()))
    }

    /// Stop playback and discard the player. The entry stays cached.
    pub async fn stop(&self, id: &str) {
        let mut cache = self.cache.lock().await;
        let Some(file) = cache.get_mut(id) else {
            self.events.emit(VoiceEvent::error(id, VoiceError::unknown_resource(id)));
            return;
        };

        file.cancel_open();
        if let Some(mut handle) = file.player.take() {
            handle.native.stop();
            handle.session.stop();
            info!(id, "Playback stopped");
        }
        self.suspended.lock().await.retain(|suspended| suspended != id);
        self.events.emit(VoiceEvent::state(id, VoiceState::Stopped));
    }

    pub async fn seek(&self, id: &str, milliseconds: u64) {
        let mut cache = self.cache.lock().await;
        let result = player_mut(&mut cache, id)
            .and_then(|handle| {
                handle
                    .native
                    .seek(Duration::from_millis(milliseconds))
                    .map_err(VoiceError::from)
            });
        match result {
            Ok(()) => self
                .events
                .emit(VoiceEvent::position(id, milliseconds as f64 / 1000.0)),
            Err(e) => self.events.emit(VoiceEvent::error(id, e)),
        }
    }

    /// Position in seconds, or -1 when there is no player
    pub async fn current_position(&self, id: &str) -> Result<f64, VoiceError> {
        let cache = self.cache.lock().await;
        let file = cache.get(id).ok_or_else(|| VoiceError::unknown_resource(id))?;
        let seconds = file
            .player
            .as_ref()
            .and_then(|handle| handle.native.position())
            .map(|position| position.as_secs_f64())
            .unwrap_or(-1.0);

        if seconds >= 0.0 {
            self.events.emit(VoiceEvent::position(id, seconds));
        }
        Ok(seconds)
    }

    /// Duration in seconds, or -1 when unknown. Unknown ids are -1 as well.
    pub async fn duration(&self, id: &str) -> Result<f64, VoiceError> {
        let cache = self.cache.lock().await;
        let seconds = cache
            .get(id)
            .and_then(|file| file.player.as_ref())
            .and_then(|handle| handle.native.duration())
            .map(|duration| duration.as_secs_f64())
            .unwrap_or(-1.0);

        if seconds >= 0.0 {
            self.events.emit(VoiceEvent::duration(id, seconds));
        }
        Ok(seconds)
    }

    /// Store the volume and apply it to a live player.
    /// Unknown ids are ignored.
    pub async fn set_volume(&self, id: &str, level: f32) {
        if !level.is_finite() {
            warn!(id, level, "Ignoring non-finite volume");
            return;
        }
        let level = level.clamp(0.0, 1.0);

        let mut cache = self.cache.lock().await;
        let Some(file) = cache.get_mut(id) else {
            warn!(id, "Cannot set volume of unknown resource");
            return;
        };
        file.set_volume(level);
        if let Some(handle) = &file.player {
            handle.native.set_volume(level);
        }
        debug!(id, level, "Volume set");
    }

    /// Pause every running player and remember it. Returns the number paused.
    pub async fn suspend_all(&self) -> usize {
        let mut cache = self.cache.lock().await;
        let mut suspended = self.suspended.lock().await;

        for id in cache.ids() {
            let Some(handle) = cache.get_mut(&id).and_then(|file| file.player.as_mut()) else {
                continue;
            };
            if !handle.session.is_running() {
                continue;
            }
            match handle.native.pause() {
                Ok(()) => {
                    if handle.session.pause().is_ok() {
                        self.events.emit(VoiceEvent::state(&id, VoiceState::Paused));
                        suspended.push(id);
                    }
                }
                Err(e) => warn!(id = %id, error = %e, "Failed to suspend player"),
            }
        }

        info!(count = suspended.len(), "Suspended playback");
        suspended.len()
    }

    /// Resume players paused by [`Self::suspend_all`]. Returns the number resumed.
    pub async fn resume_all(&self) -> usize {
        let mut cache = self.cache.lock().await;
        let mut suspended = self.suspended.lock().await;
        let mut resumed = 0;

        for id in suspended.drain(..) {
            let Some(handle) = cache.get_mut(&id).and_then(|file| file.player.as_mut()) else {
                continue;
            };
            if !handle.session.is_paused() {
                continue;
            }
            if let Err(e) = handle.native.play() {
                warn!(id = %id, error = %e, "Failed to resume player");
                continue;
            }
            if handle.session.running().is_ok() {
                self.events.emit(VoiceEvent::state(&id, VoiceState::Running));
                resumed += 1;
            }
        }

        info!(count = resumed, "Resumed playback");
        resumed
    }

    fn fail(&self, id: &str, error: VoiceError) {
        self.events.emit(VoiceEvent::error(id, error));
        self.events.emit(VoiceEvent::state(id, VoiceState::Stopped));
    }
}

/// A player open reserved under the cache lock and performed outside it
struct PendingOpen {
    generation: u64,
    source_url: ResourceUrl,
    transcode_paths: Option<(PathBuf, PathBuf)>,
    volume: f32,
    created: bool,
}

enum Prepared {
    /// The attached player already matches the source
    Ready,
    Open(PendingOpen),
}

/// Attach an opened player if its reservation is still current; otherwise stop it
fn install(
    cache: &mut HandleCache,
    id: &str,
    pending: PendingOpen,
    native: Box<dyn PlayerHandle>,
) -> bool {
    if let Some(file) = cache.get_mut(id) {
        if file.claim_open(pending.generation) {
            file.player = Some(PlaybackHandle {
                generation: pending.generation,
                source_url: pending.source_url,
                session: PlaybackSession::new(),
                native,
            });
            return true;
        }
    }
    native.stop();
    false
}

fn player_mut<'a>(cache: &'a mut HandleCache, id: &str) -> Result<&'a mut PlaybackHandle, VoiceError> {
    let file = cache
        .get_mut(id)
        .ok_or_else(|| VoiceError::unknown_resource(id))?;
    file.player
        .as_mut()
        .ok_or_else(|| VoiceError::aborted(format!("No player for {}", id)))
}
