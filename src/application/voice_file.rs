//! Per-resource session record

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::voice::{PlaybackSession, ResolvedResource, ResourceUrl, VoiceState};

use super::ports::{PlayerHandle, RecorderHandle, TranscodeError, Transcoder};

/// Default playback volume for a fresh resource
pub const DEFAULT_VOLUME: f32 = 1.0;

/// A native player plus the bookkeeping the controllers need
pub struct PlaybackHandle {
    /// Identifies this handle in completion continuations
    pub generation: u64,
    /// Resource URL the handle was opened for
    pub source_url: ResourceUrl,
    pub session: PlaybackSession,
    pub native: Box<dyn PlayerHandle>,
}

pub struct RecordingHandle {
    pub generation: u64,
    pub native: Box<dyn RecorderHandle>,
}

/// Everything known about one resource id
pub struct VoiceFile {
    resource_path: String,
    resolved: ResolvedResource,
    for_recording: bool,
    volume: f32,
    /// Generation of a player being opened outside the cache lock
    pending_open: Option<u64>,
    pub(crate) player: Option<PlaybackHandle>,
    pub(crate) recorder: Option<RecordingHandle>,
}

impl VoiceFile {
    pub fn new(resource_path: impl Into<String>, resolved: ResolvedResource, for_recording: bool) -> Self {
        Self {
            resource_path: resource_path.into(),
            resolved,
            for_recording,
            volume: DEFAULT_VOLUME,
            pending_open: None,
            player: None,
            recorder: None,
        }
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn url(&self) -> &ResourceUrl {
        &self.resolved.url
    }

    pub fn wav_path(&self) -> Option<&Path> {
        self.resolved.wav_path.as_deref()
    }

    pub fn amr_path(&self) -> Option<&Path> {
        self.resolved.amr_path.as_deref()
    }

    /// Whether the paths were resolved as a recording target
    pub fn is_recording_target(&self) -> bool {
        self.for_recording
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    /// Replace the resolved paths; any live handles are kept
    pub(crate) fn rebind(&mut self, resource_path: &str, resolved: ResolvedResource, for_recording: bool) {
        self.resource_path = resource_path.to_string();
        self.resolved = resolved;
        self.for_recording = for_recording;
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    pub fn has_recorder(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn player_state(&self) -> VoiceState {
        self.player
            .as_ref()
            .map(|p| p.session.state())
            .unwrap_or(VoiceState::None)
    }

    /// Mark a player open as in flight, superseding any earlier one
    pub(crate) fn reserve_open(&mut self, generation: u64) {
        self.pending_open = Some(generation);
    }

    /// Clear the in-flight mark if it still belongs to `generation`
    pub(crate) fn claim_open(&mut self, generation: u64) -> bool {
        if self.pending_open == Some(generation) {
            self.pending_open = None;
            true
        } else {
            false
        }
    }

    /// Discard any in-flight open; its handle is stopped when it arrives
    pub(crate) fn cancel_open(&mut self) {
        self.pending_open = None;
    }

    pub fn is_opening(&self) -> bool {
        self.pending_open.is_some()
    }

    /// Detach the player if it is still the one identified by `generation`
    pub(crate) fn take_player_if(&mut self, generation: u64) -> Option<PlaybackHandle> {
        match &self.player {
            Some(handle) if handle.generation == generation => self.player.take(),
            _ => None,
        }
    }

    pub(crate) fn take_recorder_if(&mut self, generation: u64) -> Option<RecordingHandle> {
        match &self.recorder {
            Some(handle) if handle.generation == generation => self.recorder.take(),
            _ => None,
        }
    }

    /// Paths for transcoding, or an error for remote resources
    pub fn transcode_paths(&self) -> Result<(PathBuf, PathBuf), TranscodeError> {
        match (self.wav_path(), self.amr_path()) {
            (Some(wav), Some(amr)) => Ok((wav.to_path_buf(), amr.to_path_buf())),
            _ => Err(TranscodeError::NoLocalPath(self.resource_path.clone())),
        }
    }

    pub fn amr_to_wav(&self, transcoder: &dyn Transcoder) -> Result<(), TranscodeError> {
        let (wav, amr) = self.transcode_paths()?;
        transcoder.amr_to_wav(&amr, &wav)
    }

    pub fn wav_to_amr(&self, transcoder: &dyn Transcoder) -> Result<(), TranscodeError> {
        let (wav, amr) = self.transcode_paths()?;
        transcoder.wav_to_amr(&wav, &amr)
    }

    /// Stop whatever is live without emitting events
    pub(crate) async fn shutdown(&mut self) {
        self.cancel_open();
        if let Some(player) = self.player.take() {
            player.native.stop();
        }
        if let Some(mut recorder) = self.recorder.take() {
            if let Err(e) = recorder.native.stop().await {
                warn!(resource = %self.resource_path, error = %e, "Failed to stop recorder");
            }
        }
    }
}

impl std::fmt::Debug for VoiceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceFile")
            .field("resource_path", &self.resource_path)
            .field("url", &self.resolved.url)
            .field("volume", &self.volume)
            .field("player", &self.player_state())
            .field("recording", &self.has_recorder())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::ResourceResolver;

    struct PathsOnly;

    impl Transcoder for PathsOnly {
        fn amr_to_wav(&self, amr: &Path, wav: &Path) -> Result<(), TranscodeError> {
            assert_eq!(amr.extension().unwrap(), "amr");
            assert_eq!(wav.extension().unwrap(), "wav");
            Ok(())
        }

        fn wav_to_amr(&self, wav: &Path, amr: &Path) -> Result<(), TranscodeError> {
            self.amr_to_wav(amr, wav)
        }
    }

    #[test]
    fn remote_file_cannot_be_transcoded() {
        let resolver = ResourceResolver::new("/tmp/s", "/tmp/b");
        let resolved = resolver.resolve_for_playing("http://x/a.amr", false).unwrap();
        let file = VoiceFile::new("http://x/a.amr", resolved, false);

        let err = file.wav_to_amr(&PathsOnly).unwrap_err();
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn local_file_passes_sibling_paths() {
        let resolver = ResourceResolver::new("/tmp/s", "/tmp/b");
        let resolved = resolver.resolve_for_recording("clip").unwrap();
        let file = VoiceFile::new("clip", resolved, true);

        assert!(file.wav_to_amr(&PathsOnly).is_ok());
        assert!(file.amr_to_wav(&PathsOnly).is_ok());
        assert_eq!(file.volume(), DEFAULT_VOLUME);
        assert_eq!(file.player_state(), VoiceState::None);
    }

    #[test]
    fn later_open_supersedes_earlier_one() {
        let resolver = ResourceResolver::new("/tmp/s", "/tmp/b");
        let resolved = resolver.resolve_for_playing("http://x/a.mp3", false).unwrap();
        let mut file = VoiceFile::new("http://x/a.mp3", resolved, false);

        file.reserve_open(1);
        file.reserve_open(2);
        assert!(!file.claim_open(1));
        assert!(file.is_opening());
        assert!(file.claim_open(2));
        assert!(!file.is_opening());

        file.reserve_open(3);
        file.cancel_open();
        assert!(!file.claim_open(3));
    }
}
