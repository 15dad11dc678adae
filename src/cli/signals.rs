//! Shutdown signal handling for the bridge server

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Which OS signal asked us to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

impl ShutdownReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

/// Listens for SIGINT/SIGTERM
pub struct ShutdownSignal {
    shutdown: Arc<AtomicBool>,
    receiver: mpsc::Receiver<ShutdownReason>,
}

impl ShutdownSignal {
    /// Start listening. Must be called inside a tokio runtime.
    pub fn install() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(2);
        let shutdown = Arc::new(AtomicBool::new(false));

        for (kind, reason) in [
            (SignalKind::interrupt(), ShutdownReason::Interrupt),
            (SignalKind::terminate(), ShutdownReason::Terminate),
        ] {
            let mut stream = signal(kind)?;
            let tx = tx.clone();
            let flag = Arc::clone(&shutdown);
            tokio::spawn(async move {
                stream.recv().await;
                eprintln!("{} Received {} (shutdown)", "↓".cyan(), reason.as_str());
                flag.store(true, Ordering::SeqCst);
                let _ = tx.send(reason).await;
            });
        }

        Ok(Self {
            shutdown,
            receiver: rx,
        })
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Wait for the first shutdown signal
    pub async fn wait(&mut self) -> Option<ShutdownReason> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn installed_handler_starts_clear() {
        let signal = ShutdownSignal::install().unwrap();
        assert!(!signal.is_shutdown());
    }

    #[test]
    fn reason_names() {
        assert_eq!(ShutdownReason::Interrupt.as_str(), "SIGINT");
        assert_eq!(ShutdownReason::Terminate.as_str(), "SIGTERM");
    }
}
