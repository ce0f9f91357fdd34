//! Upstream HTTP client.
//!
//! Adapters describe a call as an [`UpstreamRequest`] and hand it to a
//! [`Transport`], which performs exactly one exchange and reports the status
//! and body text. Status interpretation, JSON parsing and retries are not the
//! transport's business (there are no retries at all).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde_json::Value;

use crate::error::GatewayError;

/// One outbound request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: header::HeaderMap,
    pub body: Value,
    pub timeout: Duration,
}

impl UpstreamRequest {
    /// A `POST` carrying `body` as JSON.
    pub fn post_json(url: String, body: Value, timeout: Duration) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: header::HeaderMap::new(),
            body,
            timeout,
        }
    }

    /// Attach `Authorization: Bearer <token>`.
    ///
    /// A token that cannot be sent as a header value is a configuration
    /// failure, reported before anything goes on the wire.
    pub fn bearer_auth(mut self, token: &str) -> Result<Self, GatewayError> {
        let mut value = header::HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            GatewayError::ConfigMissing("credential contains invalid header characters".into())
        })?;
        value.set_sensitive(true);
        self.headers.insert(header::AUTHORIZATION, value);
        Ok(self)
    }
}

/// What came back: the status code and the raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The exchange could not be completed (DNS, connect, TLS, timeout, body read).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<TransportError> for GatewayError {
    fn from(e: TransportError) -> Self {
        GatewayError::Transport(e.0)
    }
}

/// Performs a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}

/// [`Transport`] backed by a shared [`reqwest::Client`].
///
/// The client holds its connection pool behind an `Arc`, so one instance is
/// built at startup and shared by every request.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("query-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let UpstreamRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;
        let target = format!("{method} {url}");

        let response = self
            .client
            .request(method, &url)
            .headers(headers)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .with_context(|| target.clone())
            .map_err(|e| TransportError(format!("{e:#}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("{target}: reading response body"))
            .map_err(|e| TransportError(format!("{e:#}")))?;

        Ok(UpstreamResponse { status, body })
    }
}

/// Test double that answers every request with the same canned outcome and
/// records what it was asked to send.
#[cfg(test)]
pub(crate) mod mock {
    use std::sync::Mutex;

    use super::*;

    pub(crate) struct MockTransport {
        outcome: Result<UpstreamResponse, TransportError>,
        requests: Mutex<Vec<UpstreamRequest>>,
    }

    impl MockTransport {
        pub(crate) fn replying(status: u16, body: impl Into<String>) -> Self {
            Self::with_outcome(Ok(UpstreamResponse {
                status,
                body: body.into(),
            }))
        }

        pub(crate) fn replying_json(body: Value) -> Self {
            Self::replying(200, body.to_string())
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self::with_outcome(Err(TransportError(message.into())))
        }

        fn with_outcome(outcome: Result<UpstreamResponse, TransportError>) -> Self {
            Self {
                outcome,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub(crate) fn last_request(&self) -> UpstreamRequest {
            self.requests
                .lock()
                .unwrap()
                .last()
                .cloned()
                .expect("no request was sent")
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.outcome.clone()
        }
    }
}
