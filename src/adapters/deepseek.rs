//! `deepseekChat`: DeepSeek chat completions.
//!
//! DeepSeek speaks the classic chat-completions protocol, so replies normally
//! arrive in the legacy `choices` shape and map field-for-field.

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use super::{endpoint, log_outcome, Gateway};
use crate::{
    config::DeepSeekConfig,
    error::GatewayError,
    model::{ChatCompletionResult, DeepSeekChatArgs},
    normalize,
    upstream::UpstreamRequest,
};

impl Gateway {
    /// Run one DeepSeek chat completion and normalize the reply.
    #[tracing::instrument(
        name = "operation",
        skip_all,
        fields(op = "deepseekChat", upstream = "deepseek", model = tracing::field::Empty)
    )]
    pub async fn deepseek_chat(&self, args: DeepSeekChatArgs) -> ChatCompletionResult {
        let started = Instant::now();
        let result = self.try_deepseek_chat(args).await;
        log_outcome(&result, started);
        result.into()
    }

    async fn try_deepseek_chat(
        &self,
        args: DeepSeekChatArgs,
    ) -> Result<ChatCompletionResult, GatewayError> {
        let cfg = &self.config.providers.deepseek;
        let api_key = cfg.api_key()?;
        let body = request_body(cfg, &args)?;
        tracing::Span::current().record("model", body["model"].as_str());

        let request = UpstreamRequest::post_json(
            endpoint(&cfg.base_url, "/chat/completions"),
            body,
            Duration::from_millis(cfg.timeout_ms),
        )
        .bearer_auth(&api_key)?;

        let payload = self.exchange(request).await?;
        normalize::to_completion(&payload)
    }
}

/// Build the `/chat/completions` body, applying DeepSeek's defaults.
pub(crate) fn request_body(
    cfg: &DeepSeekConfig,
    args: &DeepSeekChatArgs,
) -> Result<Value, GatewayError> {
    if args.stream {
        return Err(GatewayError::CallerInput(
            "streaming responses are not supported; omit `stream` or set it to false".into(),
        ));
    }
    if args.messages.is_empty() {
        return Err(GatewayError::CallerInput("`messages` must not be empty".into()));
    }

    let model = args
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(cfg.default_model.as_str());

    let mut body = json!({
        "model": model,
        "messages": args.messages,
        "stream": false,
    });
    if let Some(temperature) = args.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = args.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    Ok(body)
}
