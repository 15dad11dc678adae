//! Audio session backed by cpal device discovery
//!
//! Desktop hosts have no session object to activate; acquiring checks that
//! the default host exposes any device, and configuring checks the device
//! the category needs. The output route maps to an output device name that
//! players read when they open.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::debug;

use crate::application::ports::{AudioSession, SessionCategory, SessionError};
use crate::domain::voice::OutputRoute;

/// Name fragments of devices that stand in for a handset earpiece
const EARPIECE_HINTS: &[&str] = &["headset", "headphone", "earpiece", "handset", "hands-free"];

#[derive(Debug, Clone, Default)]
struct Selected {
    route: OutputRoute,
    device: Option<String>,
}

/// Output route shared between the session and the player.
/// `None` as device means the host default.
#[derive(Debug, Clone, Default)]
pub struct OutputSelection(Arc<RwLock<Selected>>);

impl OutputSelection {
    pub fn route(&self) -> OutputRoute {
        self.0.read().map(|s| s.route).unwrap_or_default()
    }

    pub fn device(&self) -> Option<String> {
        self.0.read().ok().and_then(|s| s.device.clone())
    }

    fn select(&self, route: OutputRoute, device: Option<String>) {
        if let Ok(mut selected) = self.0.write() {
            *selected = Selected { route, device };
        }
    }
}

/// First device name that looks like an earpiece or headset
pub fn pick_earpiece<I, S>(names: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).find(|name| {
        let lower = name.to_lowercase();
        EARPIECE_HINTS.iter().any(|hint| lower.contains(hint))
    })
}

#[derive(Debug, Default)]
pub struct CpalAudioSession {
    selection: OutputSelection,
}

impl CpalAudioSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for players that should follow the selected route
    pub fn selection(&self) -> OutputSelection {
        self.selection.clone()
    }
}

#[async_trait]
impl AudioSession for CpalAudioSession {
    async fn acquire(&self) -> Result<(), SessionError> {
        let host = cpal::default_host();
        debug!(host = ?host.id(), "Acquiring audio session");
        if host.default_output_device().is_none() && host.default_input_device().is_none() {
            return Err(SessionError::Unavailable(format!(
                "{:?} host has no audio devices",
                host.id()
            )));
        }
        Ok(())
    }

    async fn configure(&self, category: SessionCategory) -> Result<(), SessionError> {
        let host = cpal::default_host();
        let available = match category {
            SessionCategory::Playback => host.default_output_device().is_some(),
            SessionCategory::Record => host.default_input_device().is_some(),
        };

        if !available {
            return Err(SessionError::Configure {
                category,
                message: "no default device".to_string(),
            });
        }
        Ok(())
    }

    async fn set_output_route(&self, route: OutputRoute) -> Result<(), SessionError> {
        let device = match route {
            OutputRoute::Speaker => None,
            OutputRoute::Earpiece => {
                let names = tokio::task::spawn_blocking(|| {
                    cpal::default_host()
                        .output_devices()
                        .map(|devices| devices.filter_map(|d| d.name().ok()).collect::<Vec<_>>())
                        .unwrap_or_default()
                })
                .await
                .unwrap_or_default();

                let name = pick_earpiece(names).ok_or_else(|| SessionError::Route {
                    route,
                    message: "no headset or earpiece output device".to_string(),
                })?;
                Some(name)
            }
        };

        debug!(%route, ?device, "Output route set");
        self.selection.select(route, device);
        Ok(())
    }

    fn output_route(&self) -> OutputRoute {
        self.selection.route()
    }
}
