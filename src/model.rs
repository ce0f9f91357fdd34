//! Canonical data model shared by every operation.
//!
//! [`ChatCompletionResult`] is what the chat operations hand back to callers no
//! matter which upstream wire format produced it. On failure only `error` is
//! populated; every data field is serialized as an explicit `null` so callers
//! can tell "no result" apart from "empty result".

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::GatewayError;

/// A caller-supplied chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: String,
    /// Clients replaying tool-call turns send `null` content; that maps to `""`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// The assistant turn inside a [`Choice`].
///
/// `content` stays `None` when the upstream sent `null` (tool-call turns), and
/// fields this gateway does not model, such as `tool_calls`, ride along in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReplyMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReplyMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            extra: Map::new(),
        }
    }
}

/// One generated alternative.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ReplyMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token accounting. Each count is optional so that a legacy reply which omits
/// a count passes that absence through instead of reporting a fake zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

/// The canonical chat completion returned by the DeepSeek and OpenAI operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatCompletionResult {
    pub id: Option<String>,
    pub object: Option<String>,
    pub created: Option<i64>,
    pub model: Option<String>,
    pub choices: Option<Vec<Choice>>,
    pub usage: Option<Usage>,
    pub error: Option<String>,
}

impl ChatCompletionResult {
    /// Build the "no result" envelope: `error` set, everything else unset.
    pub fn failure(err: &GatewayError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::default()
        }
    }
}

impl From<Result<ChatCompletionResult, GatewayError>> for ChatCompletionResult {
    fn from(result: Result<ChatCompletionResult, GatewayError>) -> Self {
        match result {
            Ok(completion) => completion,
            Err(err) => Self::failure(&err),
        }
    }
}

/// Envelope for the agent operation, whose payload is owned by a third party
/// and therefore kept as untyped JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResult {
    pub success: bool,
    pub response: Option<Value>,
    pub error: Option<String>,
}

impl AgentResult {
    pub fn failure(err: &GatewayError) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(err.to_string()),
        }
    }
}

impl From<Result<Value, GatewayError>> for AgentResult {
    fn from(result: Result<Value, GatewayError>) -> Self {
        match result {
            Ok(response) => Self {
                success: true,
                response: Some(response),
                error: None,
            },
            Err(err) => Self::failure(&err),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Operation arguments
// ──────────────────────────────────────────────────────────────────────────────

/// Arguments of `deepseekChat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepSeekChatArgs {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default, alias = "max_tokens")]
    pub max_tokens: Option<u32>,
}

/// Reasoning hint forwarded to the OpenAI Responses API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReasoningArgs {
    pub effort: String,
}

/// Arguments of `openaiResponse`. At least one of `input` / `messages` is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiResponseArgs {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub reasoning: Option<ReasoningArgs>,
}

/// Arguments of `weatherAgent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAgentArgs {
    pub messages: Vec<ChatMessage>,
    #[serde(default, alias = "run_id")]
    pub run_id: Option<String>,
    #[serde(default, alias = "runtime_context")]
    pub runtime_context: Option<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
