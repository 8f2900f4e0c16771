//! Best-effort HTTP delivery of threat reports.

use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::Client;
use sentra_guard::{GuardError, GuardResult, ThreatSink};
use sentra_types::{format_timestamp, ThreatEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Body POSTed for each threat event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookReport {
    #[serde(rename = "type")]
    pub kind: String,
    pub details: String,
    pub timestamp: String,
}

impl From<&ThreatEvent> for WebhookReport {
    fn from(event: &ThreatEvent) -> Self {
        Self {
            kind: event.kind.as_str().to_string(),
            details: event.details.clone(),
            timestamp: format_timestamp(event.observed_at),
        }
    }
}

/// Posts [`WebhookReport`]s to a configured URL.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    /// `token`, when given, is appended as a URL-encoded `token` query
    /// parameter.
    pub fn new(url: &str, token: Option<&str>, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, url, token)
    }

    pub fn with_client(client: Client, url: &str, token: Option<&str>) -> ClientResult<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ClientError::Config("webhook.url must not be empty".into()));
        }
        Ok(Self {
            client,
            url: with_token(url, token),
        })
    }

    pub async fn send(&self, report: &WebhookReport) -> ClientResult<()> {
        let response = self.client.post(&self.url).json(report).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http(format!("webhook returned {status}")));
        }
        Ok(())
    }
}

impl fmt::Debug for WebhookSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl ThreatSink for WebhookSink {
    async fn report(&self, event: &ThreatEvent) -> GuardResult<()> {
        debug!(id = %event.id, "posting threat report");
        self.send(&WebhookReport::from(event))
            .await
            .map_err(|e| GuardError::Report(e.to_string()))
    }
}

/// Appends `token=<encoded>` to `url`, respecting an existing query string.
#[must_use]
pub fn with_token(url: &str, token: Option<&str>) -> String {
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        None => url.to_string(),
        Some(token) => {
            let sep = if url.contains('?') { '&' } else { '?' };
            format!("{url}{sep}token={}", urlencoding::encode(token))
        }
    }
}

/// Fetches a short text resource, such as an announcement banner.
pub async fn fetch_text(client: &Client, url: &str) -> ClientResult<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Http(format!("{url} returned {status}")));
    }
    Ok(response.text().await?.trim().to_string())
}
