//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default socket file name, placed in the runtime directory
pub const DEFAULT_SOCKET_NAME: &str = "voice-bridge.sock";

/// Default log filter
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// App-writable directory for recordings and `documents://` resources
    pub storage_dir: Option<String>,
    /// Read-only directory searched first for relative playback sources
    pub bundle_dir: Option<String>,
    /// Bridge socket path
    pub socket_path: Option<String>,
    /// Check local playback sources exist before starting playback
    pub validate_playback: Option<bool>,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            storage_dir: Some(default_storage_dir().to_string_lossy().to_string()),
            bundle_dir: Some(default_bundle_dir().to_string_lossy().to_string()),
            socket_path: Some(default_socket_path().to_string_lossy().to_string()),
            validate_playback: Some(true),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            storage_dir: other.storage_dir.or(self.storage_dir),
            bundle_dir: other.bundle_dir.or(self.bundle_dir),
            socket_path: other.socket_path.or(self.socket_path),
            validate_playback: other.validate_playback.or(self.validate_playback),
            log_level: other.log_level.or(self.log_level),
        }
    }

    pub fn storage_dir_or_default(&self) -> PathBuf {
        self.storage_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_dir)
    }

    pub fn bundle_dir_or_default(&self) -> PathBuf {
        self.bundle_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_bundle_dir)
    }

    pub fn socket_path_or_default(&self) -> PathBuf {
        self.socket_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_socket_path)
    }

    /// Get validate_playback setting, or true if not set
    pub fn validate_playback_or_default(&self) -> bool {
        self.validate_playback.unwrap_or(true)
    }

    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("voice-bridge")
        .join("documents")
}

fn default_bundle_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("voice-bridge")
        .join("bundle")
}

/// Prefer XDG_RUNTIME_DIR, fall back to the temp directory
fn default_socket_path() -> PathBuf {
    std::env::var("XDG_RUNTIME_DIR")
        .map(|dir| PathBuf::from(dir).join(DEFAULT_SOCKET_NAME))
        .unwrap_or_else(|_| std::env::temp_dir().join(DEFAULT_SOCKET_NAME))
}
