//! `reqwest`-backed implementation of [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use crate::application::transport::{Transport, TransportError};

/// HTTP transport with a per-request timeout.
///
/// `reqwest::Client` is reference-counted internally, so cloning a
/// `ReqwestTransport` shares one connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport whose requests fail after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    async fn read_body(url: &str, response: Response) -> Result<String, TransportError> {
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| TransportError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn request_error(url: &str, e: reqwest::Error) -> TransportError {
    let reason = if e.is_timeout() {
        "timed out".to_string()
    } else {
        e.to_string()
    };
    TransportError::Request {
        url: url.to_string(),
        reason,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        Self::read_body(url, response).await
    }

    async fn put(&self, url: &str, body: String) -> Result<String, TransportError> {
        debug!("PUT {url} ({} bytes)", body.len());
        let response = self
            .client
            .put(url)
            .body(body)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;
        Self::read_body(url, response).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
