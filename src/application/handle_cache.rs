//! Resource id to session mapping

use std::collections::HashMap;

use tracing::debug;

use crate::domain::error::VoiceError;
use crate::domain::voice::{ResolvedResource, ResourceResolver};

use super::voice_file::VoiceFile;

/// Map from resource id to its [`VoiceFile`].
///
/// Holds at most one entry per id. Entries are created lazily and live
/// until released.
#[derive(Debug)]
pub struct HandleCache {
    resolver: ResourceResolver,
    files: HashMap<String, VoiceFile>,
    next_generation: u64,
}

impl HandleCache {
    pub fn new(resolver: ResourceResolver) -> Self {
        Self {
            resolver,
            files: HashMap::new(),
            next_generation: 1,
        }
    }

    pub fn resolver(&self) -> &ResourceResolver {
        &self.resolver
    }

    /// Look up `id`, resolving `resource_path` into a new entry if absent.
    ///
    /// An existing entry is re-resolved when the resource path changed, or
    /// when a recording needs paths that were resolved for playback. A failed
    /// resolution leaves the cache untouched.
    ///
    /// Returns the entry and whether it was created by this call.
    pub fn get_or_create(
        &mut self,
        id: &str,
        resource_path: &str,
        for_recording: bool,
        validate: bool,
    ) -> Result<(&mut VoiceFile, bool), VoiceError> {
        let existing = self.files.get(id).map(|file| {
            let stale_path = file.resource_path() != resource_path;
            let needs_recording_paths = for_recording && !file.is_recording_target();
            stale_path || needs_recording_paths
        });

        if let Some(needs_resolve) = existing {
            let rebound = if needs_resolve {
                let resolved = self.resolve(resource_path, for_recording, validate)?;
                debug!(id, resource_path, "Re-resolved resource");
                Some(resolved)
            } else {
                None
            };
            let file = self
                .files
                .get_mut(id)
                .ok_or_else(|| VoiceError::unknown_resource(id))?;
            if let Some(resolved) = rebound {
                file.rebind(resource_path, resolved, for_recording);
            }
            return Ok((file, false));
        }

        let resolved = self.resolve(resource_path, for_recording, validate)?;
        debug!(id, resource_path, url = %resolved.url, "Created resource");
        let file = self
            .files
            .entry(id.to_string())
            .or_insert_with(|| VoiceFile::new(resource_path, resolved, for_recording));
        Ok((file, true))
    }

    fn resolve(
        &self,
        resource_path: &str,
        for_recording: bool,
        validate: bool,
    ) -> Result<ResolvedResource, VoiceError> {
        if for_recording {
            self.resolver.resolve_for_recording(resource_path)
        } else {
            self.resolver.resolve_for_playing(resource_path, validate)
        }
    }

    pub fn get(&self, id: &str) -> Option<&VoiceFile> {
        self.files.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut VoiceFile> {
        self.files.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.files.contains_key(id)
    }

    /// Remove the entry for `id`; the caller owns stopping its handles
    pub fn remove(&mut self, id: &str) -> Option<VoiceFile> {
        self.files.remove(id)
    }

    /// Remove every entry
    pub fn drain(&mut self) -> Vec<(String, VoiceFile)> {
        self.files.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// Ids whose recorder is live
    pub fn recording_ids(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|(_, file)| file.has_recorder())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Allocate an identifier for a new native handle
    pub fn next_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::VoiceErrorCode;
    use crate::domain::voice::ResourceUrl;

    fn cache(dir: &std::path::Path) -> HandleCache {
        HandleCache::new(ResourceResolver::new(dir.join("storage"), dir.join("bundle")))
    }

    #[test]
    fn creates_once_per_id() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = cache(tmp.path());

        let (_, created) = cache.get_or_create("a", "a", true, false).unwrap();
        assert!(created);
        let (_, created) = cache.get_or_create("a", "a", true, false).unwrap();
        assert!(!created);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_resolution_leaves_no_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = cache(tmp.path());

        let err = cache.get_or_create("a", "missing.wav", false, true).unwrap_err();
        assert_eq!(err.code, VoiceErrorCode::NoneSupported);
        assert!(!cache.contains("a"));
    }

    #[test]
    fn changed_source_is_re_resolved_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = cache(tmp.path());

        let (file, _) = cache.get_or_create("a", "one.wav", false, false).unwrap();
        file.set_volume(0.3);
        let (file, created) = cache.get_or_create("a", "two.wav", false, false).unwrap();

        assert!(!created);
        assert_eq!(file.resource_path(), "two.wav");
        assert_eq!(
            file.url(),
            &ResourceUrl::Local(tmp.path().join("storage").join("two.wav"))
        );
        assert_eq!(file.volume(), 0.3);
    }

    #[test]
    fn recorded_clip_keeps_recording_paths_for_playback() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = cache(tmp.path());

        cache.get_or_create("memo", "memo", true, false).unwrap();
        let (file, _) = cache.get_or_create("memo", "memo", false, true).unwrap();
        assert_eq!(
            file.url(),
            &ResourceUrl::Local(tmp.path().join("storage").join("memo.wav"))
        );
    }

    #[test]
    fn generations_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = cache(tmp.path());
        let a = cache.next_generation();
        let b = cache.next_generation();
        assert_ne!(a, b);
    }

    #[test]
    fn remove_and_drain() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = cache(tmp.path());
        cache.get_or_create("a", "a", true, false).unwrap();
        cache.get_or_create("b", "b", true, false).unwrap();

        assert!(cache.remove("a").is_some());
        assert!(cache.remove("a").is_none());
        assert_eq!(cache.drain().len(), 1);
        assert!(cache.is_empty());
    }
}
