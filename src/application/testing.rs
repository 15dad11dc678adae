//! In-memory port implementations for controller tests

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::domain::error::VoiceErrorCode;
use crate::domain::recording::{PowerReading, RecorderSettings};
use crate::domain::voice::{
    MsgType, OutputRoute, ResourceResolver, ResourceUrl, VoiceEvent, VoiceState,
};

use super::bridge::{BridgeAdapter, BridgeConfig, BridgePorts};
use super::ports::*;

#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<VoiceEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<VoiceEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn for_id(&self, id: &str) -> Vec<VoiceEvent> {
        self.events().into_iter().filter(|e| e.id == id).collect()
    }

    pub fn states(&self, id: &str) -> Vec<VoiceState> {
        self.for_id(id).iter().filter_map(|e| e.as_state()).collect()
    }

    pub fn errors(&self, id: &str) -> Vec<VoiceErrorCode> {
        self.for_id(id)
            .iter()
            .filter_map(|e| e.as_error().map(|err| err.code))
            .collect()
    }

    pub fn of_type(&self, id: &str, msg_type: MsgType) -> Vec<VoiceEvent> {
        self.for_id(id)
            .into_iter()
            .filter(|e| e.msg_type == msg_type)
            .collect()
    }

    /// Poll until `predicate` holds or a second passes
    pub async fn wait_for(&self, predicate: impl Fn(&[VoiceEvent]) -> bool) -> bool {
        for _ in 0..100 {
            if predicate(&self.events()) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: VoiceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
pub struct PlayerLog {
    pub opened: Vec<(ResourceUrl, f32)>,
    pub completions: Vec<Option<PlaybackCompletion>>,
    pub played: usize,
    pub paused: usize,
    pub stopped: usize,
    pub seeks: Vec<Duration>,
    pub volumes: Vec<f32>,
}

pub struct MockPlayer {
    log: Arc<Mutex<PlayerLog>>,
    fail_with: Option<PlayerError>,
    duration: Option<Duration>,
    /// Simulated download time for remote URLs
    remote_delay: Duration,
}

impl MockPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::default(),
            fail_with: None,
            duration: Some(Duration::from_millis(2500)),
            remote_delay: Duration::ZERO,
        })
    }

    /// A player whose remote opens take `delay`
    pub fn slow_remote(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            log: Arc::default(),
            fail_with: None,
            duration: Some(Duration::from_millis(2500)),
            remote_delay: delay,
        })
    }

    pub fn failing(error: PlayerError) -> Arc<Self> {
        Arc::new(Self {
            log: Arc::default(),
            fail_with: Some(error),
            duration: None,
            remote_delay: Duration::ZERO,
        })
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, PlayerLog> {
        self.log.lock().unwrap()
    }

    pub fn opened_urls(&self) -> Vec<ResourceUrl> {
        self.log().opened.iter().map(|(url, _)| url.clone()).collect()
    }

    /// Fire the completion continuation of the most recently opened player
    pub fn complete_last(&self, outcome: PlaybackOutcome) {
        let completion = self
            .log()
            .completions
            .last_mut()
            .and_then(|slot| slot.take());
        if let Some(done) = completion {
            done(outcome);
        }
    }

    /// Fire the completion continuation of the `index`th opened player
    pub fn complete_at(&self, index: usize, outcome: PlaybackOutcome) {
        let completion = self
            .log()
            .completions
            .get_mut(index)
            .and_then(|slot| slot.take());
        if let Some(done) = completion {
            done(outcome);
        }
    }
}

#[async_trait]
impl AudioPlayer for MockPlayer {
    async fn open(
        &self,
        url: &ResourceUrl,
        volume: f32,
        on_complete: PlaybackCompletion,
    ) -> Result<Box<dyn PlayerHandle>, PlayerError> {
        if url.is_remote() && !self.remote_delay.is_zero() {
            tokio::time::sleep(self.remote_delay).await;
        }
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let mut log = self.log();
        log.opened.push((url.clone(), volume));
        log.completions.push(Some(on_complete));
        Ok(Box::new(MockPlayerHandle {
            log: Arc::clone(&self.log),
            position: Mutex::new(Duration::ZERO),
            duration: self.duration,
        }))
    }
}

struct MockPlayerHandle {
    log: Arc<Mutex<PlayerLog>>,
    position: Mutex<Duration>,
    duration: Option<Duration>,
}

impl PlayerHandle for MockPlayerHandle {
    fn play(&self) -> Result<(), PlayerError> {
        self.log.lock().unwrap().played += 1;
        Ok(())
    }

    fn pause(&self) -> Result<(), PlayerError> {
        self.log.lock().unwrap().paused += 1;
        Ok(())
    }

    fn stop(&self) {
        self.log.lock().unwrap().stopped += 1;
        *self.position.lock().unwrap() = Duration::ZERO;
    }

    fn seek(&self, position: Duration) -> Result<(), PlayerError> {
        self.log.lock().unwrap().seeks.push(position);
        *self.position.lock().unwrap() = position;
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        self.log.lock().unwrap().volumes.push(volume);
    }

    fn position(&self) -> Option<Duration> {
        Some(*self.position.lock().unwrap())
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

#[derive(Default)]
pub struct RecorderLog {
    pub started: Vec<(PathBuf, RecorderSettings)>,
    pub stopped: usize,
    pub interrupts: Vec<Option<RecordingInterruption>>,
}

pub struct MockRecorder {
    log: Arc<Mutex<RecorderLog>>,
    fail_with: Option<RecordingError>,
    power: PowerReading,
}

impl MockRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::default(),
            fail_with: None,
            power: PowerReading {
                average: -30.0,
                peak: -12.0,
            },
        })
    }

    pub fn failing(error: RecordingError) -> Arc<Self> {
        Arc::new(Self {
            log: Arc::default(),
            fail_with: Some(error),
            power: PowerReading::silent(),
        })
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, RecorderLog> {
        self.log.lock().unwrap()
    }

    /// Fire the interruption continuation of the most recent recorder
    pub fn interrupt_last(&self, message: &str) {
        let hook = self.log().interrupts.last_mut().and_then(|slot| slot.take());
        if let Some(hook) = hook {
            hook(message.to_string());
        }
    }
}

#[async_trait]
impl AudioRecorder for MockRecorder {
    async fn start(
        &self,
        target: &Path,
        settings: RecorderSettings,
        on_interrupt: RecordingInterruption,
    ) -> Result<Box<dyn RecorderHandle>, RecordingError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let mut log = self.log();
        log.started.push((target.to_path_buf(), settings));
        log.interrupts.push(Some(on_interrupt));
        Ok(Box::new(MockRecorderHandle {
            log: Arc::clone(&self.log),
            recording: AtomicBool::new(true),
            power: self.power,
        }))
    }
}

struct MockRecorderHandle {
    log: Arc<Mutex<RecorderLog>>,
    recording: AtomicBool,
    power: PowerReading,
}

#[async_trait]
impl RecorderHandle for MockRecorderHandle {
    async fn stop(&mut self) -> Result<(), RecordingError> {
        if self.recording.swap(false, Ordering::SeqCst) {
            self.log.lock().unwrap().stopped += 1;
        }
        Ok(())
    }

    fn power(&self) -> PowerReading {
        self.power
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    fn elapsed_ms(&self) -> u64 {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeCall {
    AmrToWav { amr: PathBuf, wav: PathBuf },
    WavToAmr { wav: PathBuf, amr: PathBuf },
}

#[derive(Default)]
pub struct MockTranscoder {
    calls: Mutex<Vec<TranscodeCall>>,
    fail_with: Option<TranscodeError>,
}

impl MockTranscoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(error: TranscodeError) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::default(),
            fail_with: Some(error),
        })
    }

    pub fn calls(&self) -> Vec<TranscodeCall> {
        self.calls.lock().unwrap().clone()
    }

    fn outcome(&self) -> Result<(), TranscodeError> {
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Transcoder for MockTranscoder {
    fn amr_to_wav(&self, amr: &Path, wav: &Path) -> Result<(), TranscodeError> {
        self.calls.lock().unwrap().push(TranscodeCall::AmrToWav {
            amr: amr.to_path_buf(),
            wav: wav.to_path_buf(),
        });
        self.outcome()
    }

    fn wav_to_amr(&self, wav: &Path, amr: &Path) -> Result<(), TranscodeError> {
        self.calls.lock().unwrap().push(TranscodeCall::WavToAmr {
            wav: wav.to_path_buf(),
            amr: amr.to_path_buf(),
        });
        self.outcome()
    }
}

#[derive(Default)]
pub struct MockSession {
    pub acquired: AtomicUsize,
    pub configured: Mutex<Vec<SessionCategory>>,
    pub refuse_record: bool,
    pub refuse_earpiece: bool,
    pub route: Mutex<OutputRoute>,
}

impl MockSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn without_microphone() -> Arc<Self> {
        Arc::new(Self {
            refuse_record: true,
            ..Self::default()
        })
    }

    pub fn without_earpiece() -> Arc<Self> {
        Arc::new(Self {
            refuse_earpiece: true,
            ..Self::default()
        })
    }
}

#[async_trait]
impl AudioSession for MockSession {
    async fn acquire(&self) -> Result<(), SessionError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn configure(&self, category: SessionCategory) -> Result<(), SessionError> {
        if self.refuse_record && category == SessionCategory::Record {
            return Err(SessionError::Configure {
                category,
                message: "no input device".to_string(),
            });
        }
        self.configured.lock().unwrap().push(category);
        Ok(())
    }

    async fn set_output_route(&self, route: OutputRoute) -> Result<(), SessionError> {
        if self.refuse_earpiece && route == OutputRoute::Earpiece {
            return Err(SessionError::Route {
                route,
                message: "no headset".to_string(),
            });
        }
        *self.route.lock().unwrap() = route;
        Ok(())
    }

    fn output_route(&self) -> OutputRoute {
        *self.route.lock().unwrap()
    }
}

/// A bridge wired to mocks over a temporary storage directory
pub struct Harness {
    pub bridge: BridgeAdapter,
    pub events: Arc<CollectingSink>,
    pub player: Arc<MockPlayer>,
    pub recorder: Arc<MockRecorder>,
    pub transcoder: Arc<MockTranscoder>,
    pub session: Arc<MockSession>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::custom(
            MockPlayer::new(),
            MockRecorder::new(),
            MockTranscoder::new(),
            MockSession::new(),
        )
    }

    pub fn with_player(player: Arc<MockPlayer>) -> Self {
        Self::custom(player, MockRecorder::new(), MockTranscoder::new(), MockSession::new())
    }

    pub fn with_recorder(recorder: Arc<MockRecorder>) -> Self {
        Self::custom(MockPlayer::new(), recorder, MockTranscoder::new(), MockSession::new())
    }

    pub fn with_transcoder(transcoder: Arc<MockTranscoder>) -> Self {
        Self::custom(MockPlayer::new(), MockRecorder::new(), transcoder, MockSession::new())
    }

    pub fn with_session(session: Arc<MockSession>) -> Self {
        Self::custom(MockPlayer::new(), MockRecorder::new(), MockTranscoder::new(), session)
    }

    pub fn custom(
        player: Arc<MockPlayer>,
        recorder: Arc<MockRecorder>,
        transcoder: Arc<MockTranscoder>,
        session: Arc<MockSession>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(CollectingSink::default());
        let config = BridgeConfig::new(ResourceResolver::new(
            dir.path().join("storage"),
            dir.path().join("bundle"),
        ));
        let ports = BridgePorts {
            player: player.clone(),
            recorder: recorder.clone(),
            transcoder: transcoder.clone(),
            session: session.clone(),
            events: events.clone(),
        };

        Self {
            bridge: BridgeAdapter::new(config, ports),
            events,
            player,
            recorder,
            transcoder,
            session,
            dir,
        }
    }

    pub fn storage(&self) -> PathBuf {
        self.dir.path().join("storage")
    }

    /// Create a file in the storage directory
    pub fn write_storage(&self, name: &str) -> PathBuf {
        let path = self.storage().join(name);
        std::fs::create_dir_all(self.storage()).unwrap();
        std::fs::write(&path, b"RIFF").unwrap();
        path
    }
}
