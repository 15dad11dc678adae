//! Resource key resolution
//!
//! Turns a caller-supplied resource path into a concrete local path or a
//! remote URL, plus the WAV/AMR sibling paths used by the transcoder.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::domain::error::VoiceError;

const DOCUMENTS_SCHEME: &str = "documents://";
const FILE_SCHEME: &str = "file://";

/// Where a resource lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceUrl {
    Local(PathBuf),
    Remote(String),
}

impl ResourceUrl {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Remote(_) => None,
        }
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}{}", FILE_SCHEME, path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Outcome of resolving a resource path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    pub url: ResourceUrl,
    /// Derived `.wav` sibling (local resources only)
    pub wav_path: Option<PathBuf>,
    /// Derived `.amr` sibling (local resources only)
    pub amr_path: Option<PathBuf>,
}

/// Resolves resource paths against the app-writable storage directory and
/// the read-only bundle directory.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    storage_dir: PathBuf,
    bundle_dir: PathBuf,
}

impl ResourceResolver {
    pub fn new(storage_dir: impl Into<PathBuf>, bundle_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            bundle_dir: bundle_dir.into(),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn bundle_dir(&self) -> &Path {
        &self.bundle_dir
    }

    /// Resolve a recording target.
    ///
    /// Recording targets always land inside the storage directory, whatever
    /// scheme or leading slash the caller used.
    pub fn resolve_for_recording(&self, resource_path: &str) -> Result<ResolvedResource, VoiceError> {
        let without_scheme = match resource_path.find("://") {
            Some(idx) => &resource_path[idx + 3..],
            None => resource_path,
        };

        let relative = sanitize_relative(without_scheme);
        if relative.as_os_str().is_empty() {
            return Err(VoiceError::none_supported(format!(
                "Cannot record to '{}'",
                resource_path
            )));
        }

        let target = self.storage_dir.join(relative);
        let wav_path = target.with_extension("wav");
        let amr_path = target.with_extension("amr");

        Ok(ResolvedResource {
            url: ResourceUrl::Local(wav_path.clone()),
            wav_path: Some(wav_path),
            amr_path: Some(amr_path),
        })
    }

    /// Resolve a playback source.
    ///
    /// With `validate`, a local source that is not a readable file yields
    /// `NONE_SUPPORTED`.
    pub fn resolve_for_playing(
        &self,
        resource_path: &str,
        validate: bool,
    ) -> Result<ResolvedResource, VoiceError> {
        if is_remote(resource_path) {
            return Ok(ResolvedResource {
                url: ResourceUrl::Remote(resource_path.to_string()),
                wav_path: None,
                amr_path: None,
            });
        }

        let path = self.local_playback_path(resource_path);

        if validate && !path.is_file() {
            return Err(VoiceError::none_supported(format!(
                "Cannot use audio file from resource '{}'",
                resource_path
            )));
        }

        Ok(ResolvedResource {
            wav_path: Some(path.with_extension("wav")),
            amr_path: Some(path.with_extension("amr")),
            url: ResourceUrl::Local(path),
        })
    }

    fn local_playback_path(&self, resource_path: &str) -> PathBuf {
        if let Some(rest) = resource_path.strip_prefix(DOCUMENTS_SCHEME) {
            return self.storage_dir.join(sanitize_relative(rest));
        }

        let stripped = strip_file_protocol(resource_path);
        let path = Path::new(stripped);
        if path.is_absolute() {
            return path.to_path_buf();
        }

        let bundled = self.bundle_dir.join(path);
        if bundled.exists() {
            bundled
        } else {
            self.storage_dir.join(sanitize_relative(stripped))
        }
    }
}

/// Whether the path names a remote resource
pub fn is_remote(resource_path: &str) -> bool {
    resource_path.starts_with("http://") || resource_path.starts_with("https://")
}

/// Remove a `file://` prefix, if present
pub fn strip_file_protocol(uri: &str) -> &str {
    uri.strip_prefix(FILE_SCHEME).unwrap_or(uri)
}

/// Keep only normal path components so the result stays under its base
fn sanitize_relative(path: &str) -> PathBuf {
    Path::new(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(dir: &Path) -> ResourceResolver {
        ResourceResolver::new(dir.join("storage"), dir.join("bundle"))
    }

    #[test]
    fn recording_derives_wav_and_amr_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());

        let resolved = r.resolve_for_recording("clip1").unwrap();
        let storage = tmp.path().join("storage");
        assert_eq!(resolved.wav_path, Some(storage.join("clip1.wav")));
        assert_eq!(resolved.amr_path, Some(storage.join("clip1.amr")));
        assert_eq!(resolved.url, ResourceUrl::Local(storage.join("clip1.wav")));
    }

    #[test]
    fn recording_ignores_scheme_and_leading_slash() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        let storage = tmp.path().join("storage");

        let a = r.resolve_for_recording("/notes/memo.amr").unwrap();
        let b = r.resolve_for_recording("documents://notes/memo.amr").unwrap();
        let c = r.resolve_for_recording("file:///notes/memo.wav").unwrap();

        let expected = Some(storage.join("notes").join("memo.amr"));
        assert_eq!(a.amr_path, expected);
        assert_eq!(b.amr_path, expected);
        assert_eq!(c.amr_path, expected);
    }

    #[test]
    fn recording_cannot_escape_storage() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());

        let resolved = r.resolve_for_recording("../../etc/clip").unwrap();
        let wav = resolved.wav_path.unwrap();
        assert!(wav.starts_with(tmp.path().join("storage")));
    }

    #[test]
    fn recording_rejects_empty_name() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        assert!(r.resolve_for_recording("documents://").is_err());
    }

    #[test]
    fn remote_playback_has_no_local_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());

        let resolved = r.resolve_for_playing("https://x/y.mp3", true).unwrap();
        assert!(resolved.url.is_remote());
        assert!(resolved.wav_path.is_none());
        assert!(resolved.amr_path.is_none());
    }

    #[test]
    fn missing_local_playback_is_none_supported() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());

        let err = r.resolve_for_playing("missing.wav", true).unwrap_err();
        assert_eq!(err.code, crate::domain::error::VoiceErrorCode::NoneSupported);
    }

    #[test]
    fn validation_can_be_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());

        let resolved = r.resolve_for_playing("missing.wav", false).unwrap();
        assert_eq!(
            resolved.url,
            ResourceUrl::Local(tmp.path().join("storage").join("missing.wav"))
        );
    }

    #[test]
    fn bundled_resource_preferred_over_storage() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        std::fs::create_dir_all(tmp.path().join("bundle")).unwrap();
        std::fs::write(tmp.path().join("bundle").join("beep.wav"), b"RIFF").unwrap();

        let resolved = r.resolve_for_playing("beep.wav", true).unwrap();
        assert_eq!(
            resolved.url,
            ResourceUrl::Local(tmp.path().join("bundle").join("beep.wav"))
        );
    }

    #[test]
    fn absolute_and_file_urls_are_used_as_is() {
        let tmp = tempfile::tempdir().unwrap();
        let r = resolver(tmp.path());
        let file = tmp.path().join("abs.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let plain = r.resolve_for_playing(file.to_str().unwrap(), true).unwrap();
        let url = format!("file://{}", file.display());
        let with_scheme = r.resolve_for_playing(&url, true).unwrap();

        assert_eq!(plain.url, ResourceUrl::Local(file.clone()));
        assert_eq!(with_scheme.url, ResourceUrl::Local(file));
    }

    #[test]
    fn strip_file_protocol_only_strips_file_scheme() {
        assert_eq!(strip_file_protocol("file:///a/b.wav"), "/a/b.wav");
        assert_eq!(strip_file_protocol("/a/b.wav"), "/a/b.wav");
        assert_eq!(strip_file_protocol("http://x/y"), "http://x/y");
    }
}
