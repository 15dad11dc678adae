//! Transcode command handler

use std::path::{Path, PathBuf};

use crate::application::ports::{TranscodeError, Transcoder};
use crate::infrastructure::AmrTranscoder;

use super::args::TranscodeDirection;
use super::presenter::Presenter;

/// Source and target paths for a direction
pub fn transcode_paths(direction: TranscodeDirection, path: &Path) -> (PathBuf, PathBuf) {
    match direction {
        TranscodeDirection::WavToAmr => (path.with_extension("wav"), path.with_extension("amr")),
        TranscodeDirection::AmrToWav => (path.with_extension("amr"), path.with_extension("wav")),
    }
}

/// Convert `path` to its sibling with the other extension
pub async fn handle_transcode_command(
    direction: TranscodeDirection,
    path: PathBuf,
    presenter: &mut Presenter,
) -> Result<PathBuf, TranscodeError> {
    let (source, target) = transcode_paths(direction, &path);

    presenter.start_spinner(&format!("Transcoding {}...", source.display()));

    let result = {
        let source = source.clone();
        let target = target.clone();
        tokio::task::spawn_blocking(move || {
            let transcoder = AmrTranscoder::new();
            match direction {
                TranscodeDirection::WavToAmr => transcoder.wav_to_amr(&source, &target),
                TranscodeDirection::AmrToWav => transcoder.amr_to_wav(&source, &target),
            }
        })
        .await
        .unwrap_or_else(|e| Err(TranscodeError::Codec(e.to_string())))
    };

    match result {
        Ok(()) => {
            presenter.spinner_success(&format!("Wrote {}", target.display()));
            Ok(target)
        }
        Err(e) => {
            presenter.spinner_fail(&format!("Transcode failed (status {})", e.code()));
            Err(e)
        }
    }
}
