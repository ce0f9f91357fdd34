//! Operation adapters, one per upstream.
//!
//! Each operation on [`Gateway`] follows the same pipeline:
//!
//! 1. resolve the provider credential (a missing one fails before any I/O),
//! 2. validate the caller's arguments and build the provider's request body,
//! 3. perform exactly one upstream exchange through the [`Transport`],
//! 4. classify failures into a [`GatewayError`], or detect and map the payload,
//! 5. fold the outcome into the operation's result envelope.
//!
//! Operations never return `Err`: every failure ends up in the envelope's
//! `error` field, so one bad upstream call cannot affect any other.

use std::{sync::Arc, time::Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::GatewayError,
    upstream::{Transport, UpstreamRequest},
};

mod agent;
mod deepseek;
mod openai;

/// Entry point for every gateway operation.
///
/// Holds only immutable configuration and the shared transport; nothing is
/// carried over from one call to the next.
pub struct Gateway {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
}

impl Gateway {
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Send one request and return its body parsed as JSON.
    ///
    /// Non-2xx replies become [`GatewayError::UpstreamStatus`]; bodies that are
    /// not JSON become [`GatewayError::Mapping`].
    async fn exchange(&self, request: UpstreamRequest) -> Result<Value, GatewayError> {
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(GatewayError::upstream_status(
                response.status,
                &response.body,
                self.config.gateway.error_body_limit,
            ));
        }

        serde_json::from_str(&response.body)
            .map_err(|e| GatewayError::Mapping(format!("response body is not valid JSON: {e}")))
    }
}

/// Join a configured base URL and an API path without doubling the slash.
fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Emit the per-call outcome event inside the operation's span.
fn log_outcome<T>(result: &Result<T, GatewayError>, started: Instant) {
    let latency_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(_) => debug!(latency_ms, "upstream call succeeded"),
        Err(e) => warn!(latency_ms, kind = e.kind(), error = %e, "upstream call failed"),
    }
}
