//! HTTP surface: the query endpoint plus liveness.
//!
//! Handlers decode the request, hand it to
//! [`crate::adapters::Gateway`] and serialize whatever comes back.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::adapters::Gateway;

pub mod query;
pub mod request_id;

/// Build the axum router served on `gateway.port`.
pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/query", post(query::query))
        .route("/operations", get(query::list_operations))
        .with_state(gateway)
}

/// `GET /healthz`: always 200 with `{"status": "ok"}`; touches no upstream.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
