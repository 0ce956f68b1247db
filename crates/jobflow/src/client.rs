//! HTTP client for communicating with a running jobflow server.

use anyhow::Result;
use serde::Deserialize;
use url::Url;

/// Health check response from the server.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Store liveness response from the server.
#[derive(Debug, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
    pub message: String,
}

/// Client for the jobflow REST API.
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    /// Create a new client for the given server URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            http: reqwest::Client::new(),
        })
    }

    /// Check server health.
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.base_url.join("/health")?;
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Server returned error: {}", response.status());
        }

        Ok(response.json().await?)
    }

    /// Ask the server to round-trip its database.
    pub async fn liveness(&self) -> Result<LivenessResponse> {
        let url = self.base_url.join("/test")?;
        let response = self.http.get(url).send().await?;
        Ok(response.json().await?)
    }
}
