//! Unix Domain Socket transport for the bridge
//!
//! Each connection is one bridge session: request lines in, reply and
//! event lines out.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::protocol::OutboundMessage;
use crate::application::BridgeAdapter;
use crate::domain::voice::{BridgeRequest, VoiceEvent};
use crate::infrastructure::BroadcastEventSink;

/// Replies queued per connection before the reader waits on the writer
const REPLY_QUEUE: usize = 32;

/// Socket file location
#[derive(Debug, Clone)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if socket file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove socket file if it exists
    pub fn cleanup(&self) -> io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Serves bridge sessions on a Unix socket.
/// The socket file is removed when the server is dropped.
pub struct BridgeSocketServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl BridgeSocketServer {
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }

    pub fn bind(&mut self) -> io::Result<()> {
        // Remove stale socket file if it exists
        self.socket_path.cleanup()?;

        if let Some(parent) = self.socket_path.path().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(self.socket_path.path())?;
        self.listener = Some(listener);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.socket_path.path()
    }

    /// Accept connections until the task is dropped
    pub async fn run(&self, bridge: Arc<BridgeAdapter>, events: BroadcastEventSink) -> io::Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let bridge = Arc::clone(&bridge);
                    let events = events.subscribe();
                    tokio::spawn(async move {
                        debug!("Bridge session opened");
                        if let Err(e) = handle_connection(stream, bridge, events).await {
                            warn!(error = %e, "Bridge session failed");
                        }
                        debug!("Bridge session closed");
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Socket accept error");
                }
            }
        }
    }

    pub fn cleanup(&self) {
        let _ = self.socket_path.cleanup();
    }
}

impl Drop for BridgeSocketServer {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Handle a single bridge session
async fn handle_connection(
    stream: UnixStream,
    bridge: Arc<BridgeAdapter>,
    events: broadcast::Receiver<VoiceEvent>,
) -> io::Result<()> {
    let (reader, writer) = stream.into_split();
    let (reply_tx, reply_rx) = mpsc::channel(REPLY_QUEUE);

    let writer_task = tokio::spawn(write_outbound(writer, reply_rx, events));

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message = match serde_json::from_str::<BridgeRequest>(line) {
            Ok(request) => {
                let reply = bridge.handle(&request).await;
                OutboundMessage::reply(request.callback_id, &reply)
            }
            Err(e) => {
                warn!(error = %e, "Malformed request line");
                OutboundMessage::malformed(format!("Malformed request: {}", e))
            }
        };

        if reply_tx.send(message).await.is_err() {
            break;
        }
    }

    drop(reply_tx);
    writer_task
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

/// Merge replies and events into the socket.
///
/// Events are drained first so the events a command emitted precede its reply.
/// A session that falls behind the event stream gets one error line and is
/// closed; the client reconnects to resync.
async fn write_outbound(
    mut writer: OwnedWriteHalf,
    mut replies: mpsc::Receiver<OutboundMessage>,
    mut events: broadcast::Receiver<VoiceEvent>,
) -> io::Result<()> {
    let mut events_open = true;

    loop {
        let message = tokio::select! {
            biased;
            event = events.recv(), if events_open => match event {
                Ok(event) => OutboundMessage::from(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Bridge session lagging, closing it");
                    write_line(&mut writer, &OutboundMessage::lagged(skipped)).await?;
                    return Ok(());
                }
                Err(broadcast::error::RecvError::Closed) => {
                    events_open = false;
                    continue;
                }
            },
            reply = replies.recv() => match reply {
                Some(reply) => reply,
                None => break,
            },
        };

        write_line(&mut writer, &message).await?;
    }

    Ok(())
}

async fn write_line(writer: &mut OwnedWriteHalf, message: &OutboundMessage) -> io::Result<()> {
    let line = message
        .to_line()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Client side of a bridge session
pub struct BridgeClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl BridgeClient {
    pub async fn connect(socket_path: &SocketPath) -> io::Result<Self> {
        let stream = UnixStream::connect(socket_path.path()).await?;
        let (reader, writer) = stream.into_split();
        info!(path = %socket_path.path().display(), "Connected to bridge");
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    pub async fn send(&mut self, request: &BridgeRequest) -> io::Result<()> {
        let mut line = serde_json::to_string(request)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }

    /// Next outbound line, or `None` once the server closed the session
    pub async fn next_message(&mut self) -> io::Result<Option<OutboundMessage>> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            return serde_json::from_str(&line)
                .map(Some)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
        }
    }
}
