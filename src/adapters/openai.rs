//! `openaiResponse`: OpenAI Responses API.
//!
//! The same logical operation can come back in two incompatible shapes:
//! the classic `choices` array or the newer typed `output` array. Both are
//! handled by the normalizer; this module only shapes the request.
//!
//! | Concern | Request | Reply |
//! |---|---|---|
//! | Prompt | `input`: caller string, else the message list | — |
//! | Effort | `reasoning.effort` (caller, else configured default) | — |
//! | Text | — | `choices[0].message.content` or `output[type=message].content[type=output_text].text` |
//! | Usage | — | `prompt/completion_tokens` or `input/output_tokens` |

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use super::{endpoint, log_outcome, Gateway};
use crate::{
    config::OpenAiConfig,
    error::GatewayError,
    model::{ChatCompletionResult, OpenAiResponseArgs},
    normalize,
    upstream::UpstreamRequest,
};

impl Gateway {
    /// Run one OpenAI response and normalize whichever format comes back.
    #[tracing::instrument(
        name = "operation",
        skip_all,
        fields(op = "openaiResponse", upstream = "openai", model = tracing::field::Empty)
    )]
    pub async fn openai_response(&self, args: OpenAiResponseArgs) -> ChatCompletionResult {
        let started = Instant::now();
        let result = self.try_openai_response(args).await;
        log_outcome(&result, started);
        result.into()
    }

    async fn try_openai_response(
        &self,
        args: OpenAiResponseArgs,
    ) -> Result<ChatCompletionResult, GatewayError> {
        let cfg = &self.config.providers.openai;
        let api_key = cfg.api_key()?;
        let body = request_body(cfg, &args)?;
        tracing::Span::current().record("model", body["model"].as_str());

        let request = UpstreamRequest::post_json(
            endpoint(&cfg.base_url, "/v1/responses"),
            body,
            Duration::from_millis(cfg.timeout_ms),
        )
        .bearer_auth(&api_key)?;

        let payload = self.exchange(request).await?;
        tracing::debug!(format = normalize::detect(&payload).name(), "classified reply");
        normalize::to_completion(&payload)
    }
}

/// Build the `/v1/responses` body.
///
/// A free-form `input` string takes precedence over `messages`; supplying
/// neither (or only empty ones) is a caller error.
pub(crate) fn request_body(
    cfg: &OpenAiConfig,
    args: &OpenAiResponseArgs,
) -> Result<Value, GatewayError> {
    let input = match (&args.input, &args.messages) {
        (Some(text), _) if !text.trim().is_empty() => json!(text),
        (_, Some(messages)) if !messages.is_empty() => json!(messages),
        _ => {
            return Err(GatewayError::CallerInput(
                "either `input` or `messages` must be provided".into(),
            ))
        }
    };

    let model = args
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(cfg.default_model.as_str());

    let mut body = json!({
        "model": model,
        "input": input,
    });

    let effort = args
        .reasoning
        .as_ref()
        .map(|r| r.effort.as_str())
        .or(cfg.default_reasoning_effort.as_deref());
    if let Some(effort) = effort {
        body["reasoning"] = json!({ "effort": effort });
    }

    Ok(body)
}
