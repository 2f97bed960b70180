//! The HTTP seam between the use cases and the network.
//!
//! The appliance protocol only ever needs two verbs: `GET` a text body and
//! `PUT` a text body, reading a text body back.  Infrastructure implements
//! this with `reqwest`; tests implement it with in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

/// Error type for HTTP transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or no response arrived (connect error,
    /// I/O error, or timeout).
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-2xx status.
    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read as text.
    #[error("failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Minimal text-over-HTTP client.
///
/// Implementations must be shareable across tasks (`Send + Sync`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `GET url` and returns the response body.
    async fn get(&self, url: &str) -> Result<String, TransportError>;

    /// Sends `PUT url` with `body` and returns the response body.
    async fn put(&self, url: &str, body: String) -> Result<String, TransportError>;
}
