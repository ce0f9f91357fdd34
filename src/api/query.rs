//! `POST /query`: the operation dispatch table.
//!
//! The body names an operation and carries its arguments:
//!
//! ```json
//! { "operation": "openaiResponse", "arguments": { "input": "Say hi" } }
//! ```
//!
//! Upstream failures are not HTTP failures: the operation's envelope is
//! returned with `200` and its `error` field set. Only requests the dispatch
//! table itself cannot serve (unknown operation, undecodable arguments) are
//! answered with a 4xx via [`AppError`].

use std::{fmt, str::FromStr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::{adapters::Gateway, error::AppError};

/// Operations the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    DeepSeekChat,
    OpenAiResponse,
    WeatherAgent,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Self::DeepSeekChat, Self::OpenAiResponse, Self::WeatherAgent];

    pub fn name(self) -> &'static str {
        match self {
            Self::DeepSeekChat => "deepseekChat",
            Self::OpenAiResponse => "openaiResponse",
            Self::WeatherAgent => "weatherAgent",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .with_context(|| format!("unknown operation `{s}`"))
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub operation: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Decode the request and dispatch it to the matching adapter.
pub async fn query(
    State(gateway): State<Arc<Gateway>>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body
        .context("invalid query request")
        .map_err(AppError::bad_request)?;
    let operation: Operation = request.operation.parse().map_err(AppError::not_found)?;
    tracing::debug!(%operation, "dispatching query");

    let response = match operation {
        Operation::DeepSeekChat => {
            Json(gateway.deepseek_chat(arguments(operation, request.arguments)?).await)
                .into_response()
        }
        Operation::OpenAiResponse => {
            Json(gateway.openai_response(arguments(operation, request.arguments)?).await)
                .into_response()
        }
        Operation::WeatherAgent => {
            Json(gateway.weather_agent(arguments(operation, request.arguments)?).await)
                .into_response()
        }
    };
    Ok(response)
}

/// `GET /operations`: the names `POST /query` accepts.
pub async fn list_operations() -> impl IntoResponse {
    let names: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
    Json(json!({ "operations": names }))
}

fn arguments<T: DeserializeOwned>(operation: Operation, raw: Value) -> Result<T, AppError> {
    // An omitted `arguments` is the same as an empty object.
    let raw = if raw.is_null() { json!({}) } else { raw };
    serde_json::from_value(raw)
        .with_context(|| format!("invalid arguments for `{operation}`"))
        .map_err(AppError::bad_request)
}
