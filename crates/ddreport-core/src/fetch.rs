//! Single-request fetch of a player document from the statistics API.

use crate::{build_report, PlayerDocument, PlayerReport, ReportError, ReportOptions, Result};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://ddnet.org/players/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Endpoint the player name is appended to as `?json2=<name>`.
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// Fetch and validate the document for `player`. Not retried.
///
/// When the document omits `player`, the requested name is used instead.
pub async fn fetch_document(player: &str, options: &FetchOptions) -> Result<PlayerDocument> {
    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .connect_timeout(options.connect_timeout)
        .user_agent(concat!("ddreport/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ReportError::Transport(format!("failed to build HTTP client: {e}")))?;

    debug!(url = %options.base_url, player, "fetching player document");

    let response = client
        .get(&options.base_url)
        .query(&[("json2", player)])
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| ReportError::Transport(format!("network error: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ReportError::Transport(format!(
            "{} answered HTTP {}",
            options.base_url, status
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ReportError::Transport(format!("failed to read response body: {e}")))?;
    debug!(bytes = body.len(), "received player document");

    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ReportError::malformed(format!("response is not JSON: {e}")))?;
    let mut document = PlayerDocument::from_value(value)?;
    if document.player.is_empty() {
        document.player = player.to_string();
    }

    Ok(document)
}

/// Fetch the document for `player` and build its report.
pub async fn fetch_report(
    player: &str,
    fetch: &FetchOptions,
    report: &ReportOptions,
) -> Result<PlayerReport> {
    let document = fetch_document(player, fetch).await?;
    build_report(&document, report)
}
