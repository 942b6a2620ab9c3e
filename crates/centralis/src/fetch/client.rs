//! HTTP access behind a trait so the fetcher can be driven by fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::error::{CentralisError, Result};

const API_KEY_HEADER: &str = "x-api-key";

/// Failure of a single remote request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Connection, timeout or other transport failure.
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The body could not be decoded.
    #[error("malformed body from {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// Transport errors, server errors and rate limiting are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network { .. } => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Body { .. } => false,
        }
    }
}

/// Source of raw resources addressed by URL.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch the raw body at `url`.
    async fn get_bytes(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError>;

    /// Fetch and decode a JSON body.
    async fn get_json(&self, url: &str) -> std::result::Result<JsonValue, FetchError> {
        let bytes = self.get_bytes(url).await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// reqwest-backed client that authenticates with an API key header.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a client. `api_key`, when present, is sent on every request.
    pub fn new(api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let mut value = HeaderValue::from_str(key)
                .map_err(|e| CentralisError::Config(format!("Invalid API key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| CentralisError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Client without credentials, for public objects and files.
    pub fn anonymous(timeout: Duration) -> Result<Self> {
        Self::new(None, timeout)
    }
}

#[async_trait]
impl ResourceClient for HttpClient {
    async fn get_bytes(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(network)?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            url: "http://api/store/1".to_string(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(!status(403).is_transient());
        assert!(
            FetchError::Network {
                url: "http://api".to_string(),
                message: "connection reset".to_string(),
            }
            .is_transient()
        );
    }

    #[test]
    fn test_invalid_api_key_is_config_error() {
        let err = HttpClient::new(Some("bad\nkey"), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CentralisError::Config(_)));
    }
}
