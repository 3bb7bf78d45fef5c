//! HTTP background-removal service client
//!
//! The service takes a multipart upload with the source in an `image_file`
//! field and answers with a cut-out image. Errors come back as JSON with a
//! `message` field.

use super::MatteProvider;
use crate::error::{NormalizeError, Result};
use crate::services::ImageIOService;
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ServiceError {
    message: Option<String>,
    detail: Option<String>,
}

/// Client for a remote background-removal endpoint
#[derive(Debug, Clone)]
pub struct RemoteMatte {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoteMatte {
    /// # Errors
    /// - Endpoint is not an http(s) URL
    /// - HTTP client cannot be built
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(NormalizeError::invalid_config(format!(
                "Matte endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NormalizeError::network_error("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

#[async_trait]
impl MatteProvider for RemoteMatte {
    async fn apply(&mut self, image: DynamicImage) -> Result<DynamicImage> {
        let png = ImageIOService::encode_png(&image)?;
        let part = multipart::Part::bytes(png)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| NormalizeError::internal(format!("invalid mime type: {e}")))?;
        let form = multipart::Form::new().part("image_file", part);

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        tracing::debug!(endpoint = %self.endpoint, "sending image to matte service");
        let response = request.send().await.map_err(|e| {
            NormalizeError::network_error(format!("Matte request to {} failed", self.endpoint), e)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            NormalizeError::network_error("Failed to read matte service response", e)
        })?;

        if !status.is_success() {
            return Err(NormalizeError::matte(format!(
                "Matte service returned {}: {}",
                status,
                service_message(&body)
            )));
        }

        let matted = ImageIOService::decode_bytes(&body)?;
        if !matted.color().has_alpha() {
            tracing::warn!("matte service returned an image without alpha");
        }
        Ok(matted)
    }

    fn name(&self) -> &str {
        "remote"
    }
}

/// Best-effort human readable error from a service response body
fn service_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ServiceError>(body) {
        if let Some(message) = parsed.message.or(parsed.detail) {
            return message;
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "no error message".to_string()
    } else {
        text.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_message_prefers_json() {
        assert_eq!(
            service_message(br#"{"message": "Invalid API key"}"#),
            "Invalid API key"
        );
        assert_eq!(service_message(br#"{"detail": "quota"}"#), "quota");
        assert_eq!(service_message(b"gateway timeout"), "gateway timeout");
        assert_eq!(service_message(b"  "), "no error message");
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(RemoteMatte::new("ftp://example.com", None, Duration::from_secs(1)).is_err());

        let remote = RemoteMatte::new(
            " https://matte.example.com/v1/segment ",
            Some(String::new()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(remote.endpoint, "https://matte.example.com/v1/segment");
        assert!(remote.api_key.is_none());
    }
}
