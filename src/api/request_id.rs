//! `X-Request-ID` middleware.
//!
//! A caller-supplied ID is kept; otherwise a UUID v4 is generated. The ID is
//! stored as a request [`Extension`](axum::Extension), echoed back in the
//! response header, and attached to a span so every log line emitted while
//! serving the request (including the adapter's outcome event) carries it.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument as _;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied ID accepted verbatim.
const MAX_CALLER_ID_LEN: usize = 128;

/// The ID assigned to the current request.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Assigns a [`RequestId`] to every request.
///
/// Apply this **inside** `tower_http::TraceLayer` so it runs within the trace span.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_CALLER_ID_LEN)
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(id.clone()));

    let span = tracing::info_span!("request", request_id = %id);
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
