//! Origin HTTP Client
//!
//! Performs network fetches of static resources against a configured origin
//! base URL.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::errors::OriginError;
use super::types::FetchedResource;
use super::Fetcher;

/// HTTP client timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for fetching resources from the origin
#[derive(Clone)]
pub struct OriginClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Origin base URL without trailing slash
    base_url: String,
}

impl OriginClient {
    /// Create a client for the given origin base URL
    ///
    /// # Arguments
    /// * `base_url` - Origin to resolve resource paths against,
    ///   e.g. `https://assets.example.com/app`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("Origin must be an http(s) URL: '{}'", base_url);
        }

        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Build the full URL for a resource path
    ///
    /// Each path segment is percent-encoded; `/` separators are preserved.
    fn resource_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url, encoded.join("/"))
    }
}

#[async_trait]
impl Fetcher for OriginClient {
    fn origin(&self) -> &str {
        &self.base_url
    }

    /// Fetch a resource from the origin
    ///
    /// Returns the response body together with its status and content type.
    /// Non-success statuses are mapped to [`OriginError`] variants; no retry
    /// is attempted.
    async fn fetch(&self, path: &str) -> Result<FetchedResource, OriginError> {
        let url = self.resource_url(path);
        debug!(path = path, url = %url, "Fetching resource from origin");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(OriginError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OriginError::from_status(status.as_u16(), &body));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(OriginError::from_transport)?;

        debug!(path = path, size = bytes.len(), "Fetched resource from origin");

        Ok(FetchedResource {
            status: status.as_u16(),
            content_type,
            body: bytes.to_vec(),
        })
    }
}
