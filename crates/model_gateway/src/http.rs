//! Shared HTTP plumbing for the backend variants.

use reqwest::{header::HeaderMap, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use warden_core::{Error, Result};

/// JSON-over-HTTPS client bound to one provider.
#[derive(Clone)]
pub(crate) struct HttpClientBase {
    pub id: &'static str,
    pub endpoint: String,
    http: Client,
}

impl HttpClientBase {
    pub fn new(id: &'static str, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client for {}: {}", id, e)))?;
        Ok(Self {
            id,
            endpoint: endpoint.into(),
            http,
        })
    }

    /// Join the endpoint and a path with exactly one slash.
    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// POST a JSON body and decode the JSON reply. Non-2xx replies become
    /// backend errors carrying the status and body.
    pub async fn post_json<Req, Res>(&self, path: &str, headers: HeaderMap, body: &Req) -> Result<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let url = self.build_url(path);
        let response = self
            .http
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::backend(format!("{} request failed: {}", self.id, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::backend(format!("{} response unreadable: {}", self.id, e)))?;

        if !status.is_success() {
            return Err(Error::backend(format!("{} returned {}: {}", self.id, status, text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::backend(format!("{} returned an unexpected body: {}", self.id, e)))
    }
}
