//! Transport boundary to the assistant backend.
//!
//! One exchange is one POST carrying the message text and a flag telling the
//! backend whether an image was attached. The transport reports whatever came
//! back (status, reason, body) without interpreting it; classification is the
//! decoder's job.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;

/// Request body sent for one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    /// Trimmed message text (may be empty when only an image is attached).
    pub message: String,
    /// Whether an attachment was staged when the turn was committed.
    pub image_present: bool,
}

/// An HTTP response as received, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase for the status (may be empty).
    pub reason: String,
    /// Raw response body.
    pub body: String,
}

impl RawReply {
    /// Build a reply, filling the reason phrase from the status code.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            reason,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any response at all.
#[derive(Debug, thiserror::Error)]
pub enum TransportFailure {
    /// Connection refused, DNS failure, reset, unreadable body...
    #[error("{0}")]
    Network(String),

    /// The configured request timeout elapsed.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The HTTP client could not be constructed.
    #[error("Failed to set up HTTP client: {0}")]
    Setup(String),
}

/// Something that can carry an [`ExchangeRequest`] to the backend.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the raw reply.
    async fn send(&self, request: &ExchangeRequest) -> Result<RawReply, TransportFailure>;
}

/// JSON-over-HTTP transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    timeout_secs: Option<u64>,
}

impl HttpTransport {
    /// Create a transport posting to `endpoint`.
    ///
    /// With `timeout_secs` unset the request may wait forever.
    pub fn new(endpoint: impl Into<String>, timeout_secs: Option<u64>) -> Result<Self, TransportFailure> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| TransportFailure::Setup(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout_secs,
        })
    }

    /// Create a transport from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, TransportFailure> {
        Self::new(config.endpoint.clone(), config.request_timeout_secs)
    }

    /// The URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_error(&self, e: &reqwest::Error) -> TransportFailure {
        match self.timeout_secs {
            Some(secs) if e.is_timeout() => TransportFailure::Timeout(secs),
            _ => TransportFailure::Network(e.to_string()),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ExchangeRequest) -> Result<RawReply, TransportFailure> {
        info!(
            endpoint = %self.endpoint,
            message_len = request.message.len(),
            image_present = request.image_present,
            "Sending message"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await.map_err(|e| self.map_error(&e))?;
        debug!(status = status.as_u16(), body_len = body.len(), "Raw response received");

        Ok(RawReply {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}
