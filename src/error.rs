//! Failure classification for the gateway.
//!
//! Two error types live here:
//!
//! - [`GatewayError`] classifies every way an operation can fail. Adapters
//!   never let it escape: it is folded into the `error` field of the
//!   operation's result envelope, so a failed upstream call is data, not a
//!   crashed request.
//! - [`AppError`] is the axum-facing error for failures of the dispatch
//!   surface itself (unknown operation, undecodable arguments). It converts
//!   into an HTTP response via [`IntoResponse`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Marker appended to an upstream body that was cut short.
const TRUNCATION_MARKER: &str = "…[truncated]";

/// Every failure an operation can report.
///
/// Each variant renders with a fixed prefix so callers and tests can match
/// on the class of failure without parsing the detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// A required credential was not available. Raised before any network call.
    #[error("configuration error: {0}")]
    ConfigMissing(String),

    /// The upstream could not be reached or the exchange did not complete.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// The reply was not JSON or did not match any known shape.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// The caller's arguments cannot produce a valid upstream request.
    #[error("invalid input: {0}")]
    CallerInput(String),
}

impl GatewayError {
    /// Build an [`GatewayError::UpstreamStatus`], keeping at most `limit`
    /// characters of the body. The status code is always kept.
    pub fn upstream_status(status: u16, body: &str, limit: usize) -> Self {
        let body = match body.char_indices().nth(limit) {
            Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &body[..cut]),
            None => body.to_string(),
        };
        Self::UpstreamStatus { status, body }
    }

    /// Stable tag for the failure class, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigMissing(_) => "config_missing",
            Self::Transport(_) => "transport",
            Self::UpstreamStatus { .. } => "upstream_status",
            Self::Mapping(_) => "mapping",
            Self::CallerInput(_) => "caller_input",
        }
    }
}

/// Error returned by axum handlers when the request itself cannot be served.
///
/// Wraps [`anyhow::Error`] together with the HTTP status to answer with.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn new(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(error: impl Into<anyhow::Error>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn not_found(error: impl Into<anyhow::Error>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, error = %self.error, "handler error");
        (
            self.status,
            Json(json!({ "error": format!("{:#}", self.error) })),
        )
            .into_response()
    }
}

/// Anything convertible to [`anyhow::Error`] becomes a 500.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(e: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e)
    }
}
