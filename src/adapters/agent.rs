//! `weatherAgent`: third-party agent orchestration server.
//!
//! The reply layout belongs to the orchestration service, so it is returned as
//! opaque JSON rather than forced into the canonical completion shape.

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use super::{endpoint, log_outcome, Gateway};
use crate::{
    config::AgentConfig,
    error::GatewayError,
    model::{AgentResult, WeatherAgentArgs},
    normalize,
    upstream::UpstreamRequest,
};

impl Gateway {
    /// Run one agent generation and return its payload untouched.
    #[tracing::instrument(
        name = "operation",
        skip_all,
        fields(op = "weatherAgent", upstream = "agent", run_id = tracing::field::Empty)
    )]
    pub async fn weather_agent(&self, args: WeatherAgentArgs) -> AgentResult {
        let started = Instant::now();
        let result = self.try_weather_agent(args).await;
        log_outcome(&result, started);
        result.into()
    }

    async fn try_weather_agent(&self, args: WeatherAgentArgs) -> Result<Value, GatewayError> {
        let cfg = &self.config.providers.agent;
        let api_key = cfg.api_key()?;
        let run_id = run_id(cfg, &args)?;
        tracing::Span::current().record("run_id", run_id);

        if args.messages.is_empty() {
            return Err(GatewayError::CallerInput("`messages` must not be empty".into()));
        }

        let mut body = json!({ "messages": args.messages });
        if let Some(context) = args.runtime_context.as_ref().filter(|c| !c.is_null()) {
            body["runtimeContext"] = context.clone();
        }

        let mut request = UpstreamRequest::post_json(
            endpoint(&cfg.base_url, &format!("/api/agents/{run_id}/generate")),
            body,
            Duration::from_millis(cfg.timeout_ms),
        );
        if let Some(key) = api_key {
            request = request.bearer_auth(&key)?;
        }

        let payload = self.exchange(request).await?;
        normalize::to_passthrough(payload)
    }
}

/// Pick the agent to run and make sure it is safe to place in a URL path.
fn run_id<'a>(cfg: &'a AgentConfig, args: &'a WeatherAgentArgs) -> Result<&'a str, GatewayError> {
    let id = args
        .run_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(cfg.default_run_id.as_str());

    if id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(id)
    } else {
        Err(GatewayError::CallerInput(format!(
            "`runId` `{id}` may only contain ASCII letters, digits, `-` and `_`"
        )))
    }
}
