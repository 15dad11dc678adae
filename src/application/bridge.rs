//! Bridge adapter: command dispatch and lifecycle

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::error::VoiceError;
use crate::domain::recording::RecorderSettings;
use crate::domain::voice::{
    BridgeCommand, BridgeReply, BridgeRequest, ResourceResolver, ResourceUrl, VoiceState,
};

use super::handle_cache::HandleCache;
use super::playback::PlaybackController;
use super::ports::{AudioPlayer, AudioRecorder, AudioSession, EventSink, Transcoder};
use super::recording::RecordingController;
use super::session::AudioSessionState;

/// External systems the bridge drives
#[derive(Clone)]
pub struct BridgePorts {
    pub player: Arc<dyn AudioPlayer>,
    pub recorder: Arc<dyn AudioRecorder>,
    pub transcoder: Arc<dyn Transcoder>,
    pub session: Arc<dyn AudioSession>,
    pub events: Arc<dyn EventSink>,
}

/// Bridge settings
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub resolver: ResourceResolver,
    /// Check local playback sources exist unless the caller overrides it
    pub validate_playback: bool,
    pub recorder_settings: RecorderSettings,
}

impl BridgeConfig {
    pub fn new(resolver: ResourceResolver) -> Self {
        Self {
            resolver,
            validate_playback: true,
            recorder_settings: RecorderSettings::speech(),
        }
    }
}

/// Read-only view of a cached resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSnapshot {
    pub resource_path: String,
    pub url: ResourceUrl,
    pub volume: f32,
    pub player_state: VoiceState,
    pub recording: bool,
}

/// Entry point for inbound commands.
///
/// Owns the handle cache and both controllers. Commands are processed one
/// at a time in arrival order.
pub struct BridgeAdapter {
    cache: Arc<Mutex<HandleCache>>,
    playback: PlaybackController,
    recording: RecordingController,
    session: Arc<AudioSessionState>,
}

impl BridgeAdapter {
    pub fn new(config: BridgeConfig, ports: BridgePorts) -> Self {
        let cache = Arc::new(Mutex::new(HandleCache::new(config.resolver)));
        let session = Arc::new(AudioSessionState::new(ports.session));

        let playback = PlaybackController::new(
            Arc::clone(&cache),
            ports.player,
            Arc::clone(&ports.transcoder),
            Arc::clone(&session),
            Arc::clone(&ports.events),
            config.validate_playback,
        );
        let recording = RecordingController::new(
            Arc::clone(&cache),
            ports.recorder,
            ports.transcoder,
            Arc::clone(&session),
            ports.events,
            config.recorder_settings,
        );

        Self {
            cache,
            playback,
            recording,
            session,
        }
    }

    /// Parse and run a raw request
    pub async fn handle(&self, request: &BridgeRequest) -> BridgeReply {
        match BridgeCommand::try_from(request) {
            Ok(command) => self.dispatch(command).await,
            Err(e) => {
                warn!(method = %request.method, error = %e, "Rejected request");
                BridgeReply::Error(e.into())
            }
        }
    }

    /// Run one command. Outcomes of fire-and-forget commands arrive as events.
    pub async fn dispatch(&self, command: BridgeCommand) -> BridgeReply {
        debug!(?command, "Dispatching");
        match command {
            BridgeCommand::Create { id, source } => self.create(&id, &source).await,
            BridgeCommand::StartRecording { id, source } => {
                self.recording.start(&id, source.as_deref()).await;
                BridgeReply::Ack
            }
            BridgeCommand::StopRecording { id } => {
                self.recording.stop(&id).await;
                BridgeReply::Ack
            }
            BridgeCommand::StartPlaying {
                id,
                source,
                options,
            } => {
                self.playback.start(&id, source.as_deref(), &options).await;
                BridgeReply::Ack
            }
            BridgeCommand::PausePlaying { id } => {
                self.playback.pause(&id).await;
                BridgeReply::Ack
            }
            BridgeCommand::StopPlaying { id } => {
                self.playback.stop(&id).await;
                BridgeReply::Ack
            }
            BridgeCommand::SeekTo { id, milliseconds } => {
                self.playback.seek(&id, milliseconds).await;
                BridgeReply::Ack
            }
            BridgeCommand::GetCurrentPosition { id } => {
                reply_with(self.playback.current_position(&id).await, BridgeReply::Number)
            }
            BridgeCommand::GetDuration { id } => {
                reply_with(self.playback.duration(&id).await, BridgeReply::Number)
            }
            BridgeCommand::GetPower { id } => {
                reply_with(self.recording.power(&id).await, BridgeReply::Power)
            }
            BridgeCommand::SetVolume { id, level } => {
                self.playback.set_volume(&id, level).await;
                BridgeReply::Ack
            }
            BridgeCommand::Release { id } => {
                self.release(&id).await;
                BridgeReply::Ack
            }
            BridgeCommand::SetOutputRoute { route } => {
                reply_with(self.session.set_output_route(route).await, |()| BridgeReply::Ack)
            }
            BridgeCommand::GetOutputRoute => {
                BridgeReply::Number(f64::from(self.session.output_route().code()))
            }
            BridgeCommand::Reset => {
                self.teardown().await;
                BridgeReply::Ack
            }
            BridgeCommand::SuspendAll => {
                self.playback.suspend_all().await;
                BridgeReply::Ack
            }
            BridgeCommand::ResumeAll => {
                self.playback.resume_all().await;
                BridgeReply::Ack
            }
        }
    }

    /// Register a resource without playing it
    async fn create(&self, id: &str, source: &str) -> BridgeReply {
        let mut cache = self.cache.lock().await;
        match cache.get_or_create(id, source, false, false) {
            Ok(_) => BridgeReply::Ack,
            Err(e) => BridgeReply::Error(e),
        }
    }

    /// Stop any live handles of `id` and forget it. Unknown ids are a no-op.
    pub async fn release(&self, id: &str) {
        let removed = self.cache.lock().await.remove(id);
        if let Some(mut file) = removed {
            file.shutdown().await;
            info!(id, "Released resource");
        }
    }

    /// Stop every live handle and empty the cache
    pub async fn teardown(&self) {
        let drained = self.cache.lock().await.drain();
        let count = drained.len();
        for (_, mut file) in drained {
            file.shutdown().await;
        }
        if count > 0 {
            info!(count, "Released all resources");
        }
    }

    pub fn session_acquired(&self) -> bool {
        self.session.is_acquired()
    }

    pub async fn snapshot(&self, id: &str) -> Option<ResourceSnapshot> {
        let cache = self.cache.lock().await;
        cache.get(id).map(|file| ResourceSnapshot {
            resource_path: file.resource_path().to_string(),
            url: file.url().clone(),
            volume: file.volume(),
            player_state: file.player_state(),
            recording: file.has_recorder(),
        })
    }

    pub async fn resource_count(&self) -> usize {
        self.cache.lock().await.len()
    }
}

fn reply_with<T>(result: Result<T, VoiceError>, wrap: impl FnOnce(T) -> BridgeReply) -> BridgeReply {
    match result {
        Ok(value) => wrap(value),
        Err(e) => BridgeReply::Error(e),
    }
}
