use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::config::NetworkConfig;
use crate::series::SeriesInfo;
use crate::traits::StatusSource;

/// Response of `GET /api/scrape-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeStatus {
    pub active_jobs: u32,
}

/// Response of `POST /refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    #[serde(default)]
    pub series_count: u32,
    #[serde(default)]
    pub jobs_queued: u32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{endpoint} returned error status: {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },
    #[error("refresh rejected by server: {0}")]
    Rejected(String),
}

/// HTTP client for the series backend.
#[derive(Clone, Debug)]
pub struct DashboardApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl DashboardApiClient {
    /// Create a new API client with configurable timeouts.
    pub fn new(base_url: &str, network_config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_status(endpoint: &'static str, status: StatusCode) -> Result<()> {
        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status }.into());
        }
        Ok(())
    }

    /// Number of scrape jobs currently pending or running.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_scrape_status(&self) -> Result<ScrapeStatus> {
        let response = self
            .client
            .get(self.url("/api/scrape-status"))
            .send()
            .await
            .context("Failed to send scrape status request")?;

        Self::check_status("/api/scrape-status", response.status())?;

        response
            .json::<ScrapeStatus>()
            .await
            .context("Failed to parse scrape status response")
    }

    /// Ask the backend to queue a scrape of every series.
    ///
    /// A 2xx answer with `success: false` is reported as [`ApiError::Rejected`].
    #[tracing::instrument(skip(self))]
    pub async fn trigger_refresh(&self) -> Result<RefreshResponse> {
        let response = self
            .client
            .post(self.url("/refresh"))
            .send()
            .await
            .context("Failed to send refresh request")?;

        Self::check_status("/refresh", response.status())?;

        let body = response
            .json::<RefreshResponse>()
            .await
            .context("Failed to parse refresh response")?;

        if !body.success {
            return Err(ApiError::Rejected(body.message).into());
        }

        tracing::info!(
            series = body.series_count,
            queued = body.jobs_queued,
            "Refresh queued"
        );
        Ok(body)
    }

    /// All tracked series.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_series(&self) -> Result<Vec<SeriesInfo>> {
        let response = self
            .client
            .get(self.url("/api/series"))
            .send()
            .await
            .context("Failed to send series request")?;

        Self::check_status("/api/series", response.status())?;

        let series = response
            .json::<Vec<SeriesInfo>>()
            .await
            .context("Failed to parse series response")?;

        tracing::debug!(count = series.len(), "Fetched series");
        Ok(series)
    }
}

impl StatusSource for DashboardApiClient {
    async fn active_jobs(&self) -> Result<u32> {
        Ok(self.fetch_scrape_status().await?.active_jobs)
    }
}
