//! Rodio-based player adapter
//!
//! Each player owns a dedicated thread: rodio's output stream is not Send,
//! so the stream, sink and decoder are created and driven there. The handle
//! talks to the thread over a channel and reads position from atomics.
//! The output device is read from the shared route selection at open time.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait};
use reqwest::Client;
use rodio::{Decoder, OutputStream, Sink, Source};
use tracing::{debug, warn};

use super::fetch::fetch_remote;
use crate::infrastructure::session::OutputSelection;
use crate::application::ports::{
    AudioPlayer, PlaybackCompletion, PlaybackOutcome, PlayerError, PlayerHandle,
};
use crate::domain::voice::ResourceUrl;

/// How often the player thread polls for end of stream
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Marks an unknown duration
const UNKNOWN: u64 = u64::MAX;

/// A playing sink whose position has not moved for this long has lost its output
const STALL_TIMEOUT: Duration = Duration::from_secs(3);

/// End of stream this far short of the known duration means the decoder gave up
const EARLY_END_TOLERANCE: Duration = Duration::from_millis(500);

enum Control {
    Play,
    Pause,
    Stop,
    Seek(Duration),
    Volume(f32),
}

#[derive(Debug)]
struct Progress {
    position_ms: AtomicU64,
    duration_ms: AtomicU64,
}

/// Audio player using rodio
pub struct RodioPlayer {
    client: Client,
    output: OutputSelection,
}

impl RodioPlayer {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            output: OutputSelection::default(),
        }
    }

    /// Follow the session's output route for players opened afterwards
    pub fn with_output(mut self, output: OutputSelection) -> Self {
        self.output = output;
        self
    }

    /// Load the encoded bytes for `url`
    pub async fn load(&self, url: &ResourceUrl) -> Result<Vec<u8>, PlayerError> {
        match url {
            ResourceUrl::Remote(remote) => fetch_remote(&self.client, remote).await,
            ResourceUrl::Local(path) => tokio::fs::read(path)
                .await
                .map_err(|e| PlayerError::NotFound(format!("{}: {}", path.display(), e))),
        }
    }
}

impl Default for RodioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn open(
        &self,
        url: &ResourceUrl,
        volume: f32,
        on_complete: PlaybackCompletion,
    ) -> Result<Box<dyn PlayerHandle>, PlayerError> {
        let bytes = self.load(url).await?;
        let device = self.output.device();
        debug!(%url, bytes = bytes.len(), ?device, "Opening player");

        let handle = tokio::task::spawn_blocking(move || {
            RodioPlayerHandle::spawn(bytes, volume, device, on_complete)
        })
        .await
        .map_err(|e| PlayerError::Failed(format!("Task join error: {}", e)))??;

        Ok(Box::new(handle))
    }
}

/// Handle to a player thread
pub struct RodioPlayerHandle {
    control: Sender<Control>,
    progress: Arc<Progress>,
}

impl RodioPlayerHandle {
    /// Start a paused player thread for `bytes` and wait until it is ready.
    /// `device` names an output device; `None` uses the default.
    pub fn spawn(
        bytes: Vec<u8>,
        volume: f32,
        device: Option<String>,
        on_complete: PlaybackCompletion,
    ) -> Result<Self, PlayerError> {
        let progress = Arc::new(Progress {
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(UNKNOWN),
        });
        let (control_tx, control_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_progress = Arc::clone(&progress);
        thread::Builder::new()
            .name("voice-player".into())
            .spawn(move || {
                let output = PlayerOutput { device, volume };
                run_player(bytes, output, control_rx, thread_progress, ready_tx, on_complete)
            })
            .map_err(|e| PlayerError::Failed(format!("Cannot spawn player thread: {}", e)))?;

        ready_rx
            .recv()
            .map_err(|_| PlayerError::Failed("Player thread exited early".into()))??;

        Ok(Self {
            control: control_tx,
            progress,
        })
    }

    fn send(&self, control: Control) -> Result<(), PlayerError> {
        self.control
            .send(control)
            .map_err(|_| PlayerError::Failed("Player thread has exited".into()))
    }
}

impl PlayerHandle for RodioPlayerHandle {
    fn play(&self) -> Result<(), PlayerError> {
        self.send(Control::Play)
    }

    fn pause(&self) -> Result<(), PlayerError> {
        self.send(Control::Pause)
    }

    fn stop(&self) {
        let _ = self.send(Control::Stop);
        self.progress.position_ms.store(0, Ordering::SeqCst);
    }

    fn seek(&self, position: Duration) -> Result<(), PlayerError> {
        self.send(Control::Seek(position))?;
        self.progress
            .position_ms
            .store(position.as_millis() as u64, Ordering::SeqCst);
        Ok(())
    }

    fn set_volume(&self, volume: f32) {
        let _ = self.send(Control::Volume(volume));
    }

    fn position(&self) -> Option<Duration> {
        Some(Duration::from_millis(
            self.progress.position_ms.load(Ordering::SeqCst),
        ))
    }

    fn duration(&self) -> Option<Duration> {
        match self.progress.duration_ms.load(Ordering::SeqCst) {
            UNKNOWN => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

struct PlayerOutput {
    device: Option<String>,
    volume: f32,
}

/// Open the named output device, or the default one
fn open_output(
    device: Option<&str>,
) -> Result<(OutputStream, rodio::OutputStreamHandle), PlayerError> {
    let Some(name) = device else {
        return OutputStream::try_default().map_err(|e| PlayerError::Device(e.to_string()));
    };

    let found = cpal::default_host()
        .output_devices()
        .map_err(|e| PlayerError::Device(e.to_string()))?
        .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| PlayerError::Device(format!("Output device {} is gone", name)))?;

    OutputStream::try_from_device(&found).map_err(|e| PlayerError::Device(e.to_string()))
}

/// Player thread body. Dropping the handle ends the thread.
fn run_player(
    bytes: Vec<u8>,
    output: PlayerOutput,
    control: Receiver<Control>,
    progress: Arc<Progress>,
    ready: Sender<Result<(), PlayerError>>,
    on_complete: PlaybackCompletion,
) {
    let PlayerOutput { device, volume } = output;
    let (_stream, stream_handle) = match open_output(device.as_deref()) {
        Ok(output) => output,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let sink = match Sink::try_new(&stream_handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = ready.send(Err(PlayerError::Device(e.to_string())));
            return;
        }
    };

    let source = match Decoder::new(Cursor::new(bytes)) {
        Ok(source) => source,
        Err(e) => {
            let _ = ready.send(Err(PlayerError::Decode(e.to_string())));
            return;
        }
    };

    let total = source.total_duration();
    if let Some(total) = total {
        progress
            .duration_ms
            .store(total.as_millis() as u64, Ordering::SeqCst);
    }

    sink.pause();
    sink.set_volume(volume);
    sink.append(source);

    if ready.send(Ok(())).is_err() {
        return;
    }

    let mut on_complete = Some(on_complete);
    let mut started = false;
    let mut watch = PlaybackWatch::new(Instant::now());

    loop {
        match control.recv_timeout(POLL_INTERVAL) {
            Ok(Control::Play) => {
                sink.play();
                started = true;
                watch.reset(Instant::now());
            }
            Ok(Control::Pause) => sink.pause(),
            Ok(Control::Seek(position)) => {
                if let Err(e) = sink.try_seek(position) {
                    warn!(error = %e, "Seek failed");
                }
                watch.reset(Instant::now());
            }
            Ok(Control::Volume(level)) => sink.set_volume(level),
            Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => {
                sink.stop();
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        if !started {
            continue;
        }

        let outcome = if sink.empty() {
            Some(watch.ended(total))
        } else if sink.is_paused() {
            watch.reset(Instant::now());
            None
        } else {
            let position = sink.get_pos();
            progress
                .position_ms
                .store(position.as_millis() as u64, Ordering::SeqCst);
            watch
                .stalled(position, Instant::now())
                .then(stall_outcome)
        };

        if let Some(outcome) = outcome {
            debug!(?outcome, "Player ended");
            sink.stop();
            if let Some(done) = on_complete.take() {
                done(outcome);
            }
            return;
        }
    }
}

/// Classifies how a started sink ended
#[derive(Debug)]
struct PlaybackWatch {
    last_position: Duration,
    last_advance: Instant,
}

impl PlaybackWatch {
    fn new(now: Instant) -> Self {
        Self {
            last_position: Duration::ZERO,
            last_advance: now,
        }
    }

    /// Restart the stall timer after a resume, pause or seek
    fn reset(&mut self, now: Instant) {
        self.last_advance = now;
    }

    /// Record the position of a playing sink. True once it stopped moving for too long.
    fn stalled(&mut self, position: Duration, now: Instant) -> bool {
        if position != self.last_position {
            self.last_position = position;
            self.last_advance = now;
            return false;
        }
        now.duration_since(self.last_advance) >= STALL_TIMEOUT
    }

    /// Outcome once the sink ran dry
    fn ended(&self, total: Option<Duration>) -> PlaybackOutcome {
        match total {
            Some(total) if self.last_position + EARLY_END_TOLERANCE < total => {
                PlaybackOutcome::DecodeFailed(format!(
                    "Stream ended at {:.2}s of {:.2}s",
                    self.last_position.as_secs_f64(),
                    total.as_secs_f64()
                ))
            }
            _ => PlaybackOutcome::Finished,
        }
    }
}

fn stall_outcome() -> PlaybackOutcome {
    let message = if cpal::default_host().default_output_device().is_some() {
        "Output stream stalled"
    } else {
        "Output device lost"
    };
    PlaybackOutcome::Interrupted(message.to_string())
}
