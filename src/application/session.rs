//! Process-wide audio session flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::domain::error::VoiceError;
use crate::domain::voice::OutputRoute;

use super::ports::{AudioSession, SessionCategory};

/// Tracks whether the platform audio session has been acquired.
///
/// Acquisition happens once per process on the first playback or
/// recording start. The category is configured on every start.
pub struct AudioSessionState {
    session: Arc<dyn AudioSession>,
    acquired: AtomicBool,
}

impl AudioSessionState {
    pub fn new(session: Arc<dyn AudioSession>) -> Self {
        Self {
            session,
            acquired: AtomicBool::new(false),
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Acquire the session if needed, then configure `category`
    pub async fn ensure(&self, category: SessionCategory) -> Result<(), VoiceError> {
        if !self.is_acquired() {
            self.session.acquire().await?;
            self.acquired.store(true, Ordering::SeqCst);
            info!("Audio session acquired");
        }
        self.session.configure(category).await?;
        Ok(())
    }

    pub async fn set_output_route(&self, route: OutputRoute) -> Result<(), VoiceError> {
        self.session.set_output_route(route).await?;
        info!(%route, "Output route selected");
        Ok(())
    }

    pub fn output_route(&self) -> OutputRoute {
        self.session.output_route()
    }
}
