//! HTTP implementation of the license authority.
//!
//! `POST {base}/login` with a [`LoginPayload`] and `POST {base}/trial` with
//! a [`TrialPayload`]; both answer with a [`LoginResponse`]. A rejection may
//! come back with a non-2xx status as long as the body is a login response.

use crate::error::ClientResult;
use async_trait::async_trait;
use reqwest::Client;
use sentra_license::{
    LicenseError, LicenseResult, LoginPayload, LoginResponse, RemoteAuthority, TrialPayload,
};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub struct HttpAuthority {
    client: Client,
    base_url: String,
}

impl HttpAuthority {
    /// Creates an authority rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> LicenseResult<LoginResponse> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(endpoint, "contacting license authority");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LicenseError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LicenseError::Network(e.without_url().to_string()))?;
        match serde_json::from_str::<LoginResponse>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(LicenseError::Network(format!(
                "license authority returned {status}"
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn validate(&self, payload: &LoginPayload) -> LicenseResult<LoginResponse> {
        self.post("login", payload).await
    }

    async fn start_trial(&self, payload: &TrialPayload) -> LicenseResult<LoginResponse> {
        self.post("trial", payload).await
    }
}
