//! Remote source download

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::application::ports::PlayerError;

/// Default timeout for remote audio downloads
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Download a remote audio source into memory.
///
/// Connection failures and non-success statuses are network errors.
pub async fn fetch_remote(client: &Client, url: &str) -> Result<Vec<u8>, PlayerError> {
    debug!(url, "Fetching remote audio");

    let response = client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| PlayerError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PlayerError::Network(format!("{} returned {}", url, status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PlayerError::Network(e.to_string()))?;

    debug!(url, bytes = bytes.len(), "Fetched remote audio");
    Ok(bytes.to_vec())
}
