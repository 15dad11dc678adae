//! Bridge server runner

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::info;

use crate::application::{BridgeAdapter, BridgeConfig, BridgePorts};
use crate::domain::config::AppConfig;
use crate::domain::voice::ResourceResolver;
use crate::infrastructure::{
    AmrTranscoder, BroadcastEventSink, CpalAudioSession, CpalRecorder, RodioPlayer,
};

use super::app::{EXIT_ERROR, EXIT_SUCCESS};
use super::ipc::{BridgeSocketServer, SocketPath};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Upper bound on stopping live handles at shutdown
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the bridge over the native adapters
pub fn build_bridge(config: &AppConfig, events: &BroadcastEventSink) -> BridgeAdapter {
    let resolver = ResourceResolver::new(
        config.storage_dir_or_default(),
        config.bundle_dir_or_default(),
    );
    let mut bridge_config = BridgeConfig::new(resolver);
    bridge_config.validate_playback = config.validate_playback_or_default();

    let session = CpalAudioSession::new();
    let ports = BridgePorts {
        player: Arc::new(RodioPlayer::new().with_output(session.selection())),
        recorder: Arc::new(CpalRecorder::new()),
        transcoder: Arc::new(AmrTranscoder::new()),
        session: Arc::new(session),
        events: Arc::new(events.clone()),
    };

    BridgeAdapter::new(bridge_config, ports)
}

/// Run the bridge until SIGINT/SIGTERM
pub async fn run_server(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let storage_dir = config.storage_dir_or_default();
    if let Err(e) = tokio::fs::create_dir_all(&storage_dir).await {
        presenter.error(&format!(
            "Failed to create storage directory {}: {}",
            storage_dir.display(),
            e
        ));
        return ExitCode::from(EXIT_ERROR);
    }

    let mut signals = match ShutdownSignal::install() {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let socket_path = SocketPath::new(config.socket_path_or_default());
    let mut server = BridgeSocketServer::new(socket_path.clone());
    if let Err(e) = server.bind() {
        presenter.error(&format!(
            "Failed to bind socket {}: {}",
            socket_path.path().display(),
            e
        ));
        return ExitCode::from(EXIT_ERROR);
    }

    let events = BroadcastEventSink::new();
    let bridge = Arc::new(build_bridge(&config, &events));

    let server_bridge = Arc::clone(&bridge);
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(server_bridge, events).await {
            tracing::error!(error = %e, "Bridge server stopped");
        }
    });

    presenter.server_status("Started, waiting for sessions...");
    presenter.info(&format!(
        "PID: {} | Socket: {} | Storage: {}",
        std::process::id(),
        socket_path.path().display(),
        storage_dir.display()
    ));

    let reason = signals.wait().await;
    info!(reason = ?reason, "Shutting down");

    // Dropping the server removes the socket file
    server_task.abort();
    let _ = server_task.await;

    if timeout(TEARDOWN_TIMEOUT, bridge.teardown()).await.is_err() {
        presenter.warn("Timed out releasing audio handles");
    }
    socket_path.cleanup().ok();

    presenter.server_status("Stopped");
    ExitCode::from(EXIT_SUCCESS)
}
