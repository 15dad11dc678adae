//! Send command handler - one request to a running bridge

use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::domain::voice::BridgeRequest;

use super::args::SendArgs;
use super::ipc::{BridgeClient, OutboundMessage, ReplyStatus, SocketPath};
use super::presenter::Presenter;

const CALLBACK_ID: &str = "cli-1";

/// Send the request, print the reply, then print events for `--wait` ms.
/// Returns the reply status.
pub async fn handle_send_command(
    args: SendArgs,
    socket_path: SocketPath,
    presenter: &Presenter,
) -> Result<ReplyStatus, String> {
    if !socket_path.exists() {
        return Err(format!(
            "No bridge running at {}. Start with: voice-bridge serve",
            socket_path.path().display()
        ));
    }

    let mut client = BridgeClient::connect(&socket_path)
        .await
        .map_err(|e| format!("Failed to connect to bridge: {}", e))?;

    let mut request = BridgeRequest::new(args.method.clone(), args.json_args());
    request.callback_id = Some(CALLBACK_ID.to_string());

    client
        .send(&request)
        .await
        .map_err(|e| format!("Failed to send request: {}", e))?;

    let status = loop {
        let message = client
            .next_message()
            .await
            .map_err(|e| format!("Failed to read from bridge: {}", e))?
            .ok_or_else(|| "Bridge closed the connection".to_string())?;

        presenter.message(&message);

        if let OutboundMessage::Reply {
            callback_id,
            status,
            ..
        } = &message
        {
            if callback_id.as_deref() == Some(CALLBACK_ID) || callback_id.is_none() {
                break *status;
            }
        }
    };

    let deadline = Instant::now() + Duration::from_millis(args.wait);
    while let Ok(next) = timeout_at(deadline, client.next_message()).await {
        match next {
            Ok(Some(message)) => presenter.message(&message),
            Ok(None) => break,
            Err(e) => return Err(format!("Failed to read from bridge: {}", e)),
        }
    }

    Ok(status)
}
