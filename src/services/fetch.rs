//! Source image download

use crate::config::FetchConfig;
use crate::error::{NormalizeError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Retrieves raw image bytes for a URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// # Errors
    /// - Transport failure, timeout, non-success status or oversize body
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// `reqwest` backed fetcher with a per-request timeout and body size cap
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    /// # Errors
    /// - HTTP client cannot be built
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NormalizeError::network_error("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    fn too_large(&self, url: &str, size: u64) -> NormalizeError {
        NormalizeError::network_error(
            format!("Response from {} too large", url),
            format!("{} bytes exceeds limit of {} bytes", size, self.max_bytes),
        )
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url, "downloading");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NormalizeError::network_error(format!("Failed to download {}", url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NormalizeError::network_error(
                format!("Failed to download {}", url),
                format!("HTTP {}", status),
            ));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(self.too_large(url, length));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            NormalizeError::network_error(format!("Failed to read body of {}", url), e)
        })? {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_bytes {
                return Err(self.too_large(url, body.len() as u64));
            }
        }

        tracing::debug!(url, bytes = body.len(), "downloaded");
        Ok(body)
    }
}
