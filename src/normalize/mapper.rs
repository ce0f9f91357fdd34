//! Projection of classified payloads onto the canonical result.
//!
//! Every branch of [`to_completion`] is one arm of an exhaustive match over
//! [`PayloadFormat`]; adding a format without deciding how it maps will not
//! compile.

use serde_json::{Map, Value};

use super::detect::{detect, PayloadFormat};
use crate::{
    error::GatewayError,
    model::{ChatCompletionResult, Choice, ReplyMessage, Usage},
};

/// `object` value given to completions synthesized from the output-array format.
const SYNTHESIZED_OBJECT: &str = "chat.completion";

/// Map a chat upstream's payload onto [`ChatCompletionResult`].
pub fn to_completion(payload: &Value) -> Result<ChatCompletionResult, GatewayError> {
    to_completion_at(payload, || chrono::Utc::now().timestamp())
}

/// Same as [`to_completion`], with the clock used for missing `created`
/// timestamps supplied by the caller.
pub(crate) fn to_completion_at(
    payload: &Value,
    now: impl FnOnce() -> i64,
) -> Result<ChatCompletionResult, GatewayError> {
    match detect(payload) {
        PayloadFormat::LegacyChoices(obj) => from_legacy(obj),
        PayloadFormat::OutputArray(obj) => Ok(from_output_array(obj, now)),
        PayloadFormat::ErrorReport(error) => Err(reported(error)),
        PayloadFormat::Passthrough(obj) => {
            let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
            Err(GatewayError::Mapping(format!(
                "unrecognized payload shape: object with keys [{}] has neither `choices` nor `output`",
                keys.join(", ")
            )))
        }
        PayloadFormat::Unrecognized(ty) => Err(unrecognized(ty)),
    }
}

/// Extract an orchestration upstream's opaque payload.
///
/// The top-level `response` field is returned when present, otherwise the
/// whole object. No field-level normalization is applied.
pub fn to_passthrough(payload: Value) -> Result<Value, GatewayError> {
    match detect(&payload) {
        PayloadFormat::Unrecognized(ty) => return Err(unrecognized(ty)),
        PayloadFormat::ErrorReport(error) => return Err(reported(error)),
        PayloadFormat::LegacyChoices(_)
        | PayloadFormat::OutputArray(_)
        | PayloadFormat::Passthrough(_) => {}
    }

    Ok(match payload {
        Value::Object(mut obj) if obj.get("response").is_some_and(|r| !r.is_null()) => {
            obj.remove("response").unwrap_or_default()
        }
        other => other,
    })
}

fn from_legacy(obj: &Map<String, Value>) -> Result<ChatCompletionResult, GatewayError> {
    let raw_choices = obj.get("choices").cloned().unwrap_or_default();
    let choices: Vec<Choice> = serde_json::from_value(raw_choices)
        .map_err(|e| GatewayError::Mapping(format!("malformed `choices`: {e}")))?;

    let usage = match obj.get("usage") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<Usage>(raw.clone())
                .map_err(|e| GatewayError::Mapping(format!("malformed `usage`: {e}")))?,
        ),
    };

    Ok(ChatCompletionResult {
        id: str_field(obj, "id"),
        object: str_field(obj, "object"),
        created: obj.get("created").and_then(Value::as_i64),
        model: str_field(obj, "model"),
        choices: Some(choices),
        usage,
        error: None,
    })
}

fn from_output_array(obj: &Map<String, Value>, now: impl FnOnce() -> i64) -> ChatCompletionResult {
    let text = obj
        .get("output")
        .and_then(Value::as_array)
        .and_then(|items| items.iter().find(|item| item["type"] == "message"))
        .and_then(|message| message["content"].as_array())
        .and_then(|parts| parts.iter().find(|part| part["type"] == "output_text"))
        .and_then(|part| part["text"].as_str())
        .unwrap_or_default();

    // Anything short of "completed" (incomplete, in_progress, failed...) counts as truncated.
    let finish_reason = if obj.get("status").and_then(Value::as_str) == Some("completed") {
        "stop"
    } else {
        "length"
    };

    let created = obj
        .get("created_at")
        .and_then(Value::as_i64)
        .or_else(|| obj.get("created").and_then(Value::as_i64))
        .unwrap_or_else(now);

    let usage = obj.get("usage").unwrap_or(&Value::Null);
    let count = |field: &str| Some(usage.get(field).and_then(Value::as_u64).unwrap_or(0));

    ChatCompletionResult {
        id: str_field(obj, "id"),
        object: Some(SYNTHESIZED_OBJECT.to_string()),
        created: Some(created),
        model: str_field(obj, "model"),
        choices: Some(vec![Choice {
            index: 0,
            message: ReplyMessage::text("assistant", text),
            finish_reason: Some(finish_reason.to_string()),
            extra: Map::new(),
        }]),
        usage: Some(Usage {
            prompt_tokens: count("input_tokens"),
            completion_tokens: count("output_tokens"),
            total_tokens: count("total_tokens"),
        }),
        error: None,
    }
}

fn str_field(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

fn reported(error: &Value) -> GatewayError {
    let detail = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    GatewayError::Mapping(format!("upstream reported an error: {detail}"))
}

fn unrecognized(ty: &str) -> GatewayError {
    GatewayError::Mapping(format!("unrecognized payload shape: expected a JSON object, got {ty}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIXED_NOW: i64 = 1_700_000_000;

    fn map(payload: Value) -> Result<ChatCompletionResult, GatewayError> {
        to_completion_at(&payload, || FIXED_NOW)
    }

    fn output_payload(status: &str, output: Value) -> Value {
        json!({
            "id": "resp_1",
            "object": "response",
            "model": "gpt-4o-2024-08-06",
            "status": status,
            "output": output,
            "usage": { "input_tokens": 12, "output_tokens": 3, "total_tokens": 15 },
        })
    }

    // -----------------------------------------------------------------------
    // LegacyChoices
    // -----------------------------------------------------------------------

    #[test]
    fn legacy_fields_pass_through_unchanged() {
        let payload = json!({
            "id": "chatcmpl-42",
            "object": "chat.completion",
            "created": 1_712_345_678,
            "model": "deepseek-chat",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "Hello!" }, "finish_reason": "stop" },
                { "index": 1, "message": { "role": "assistant", "content": "Hi." }, "finish_reason": "length" },
            ],
            "usage": { "prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11 },
        });
        let out = map(payload.clone()).unwrap();

        assert_eq!(out.id.as_deref(), Some("chatcmpl-42"));
        assert_eq!(out.object.as_deref(), Some("chat.completion"));
        assert_eq!(out.created, Some(1_712_345_678));
        assert_eq!(out.model.as_deref(), Some("deepseek-chat"));
        assert!(out.error.is_none());

        let serialized = serde_json::to_value(&out).unwrap();
        assert_eq!(serialized["choices"], payload["choices"]);
        assert_eq!(serialized["usage"], payload["usage"]);
    }

    #[test]
    fn legacy_tool_call_turn_keeps_null_content() {
        let payload = json!({
            "id": "chatcmpl-7",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "get_weather", "arguments": "{\"city\":\"Oslo\"}" },
                    }],
                },
                "finish_reason": "tool_calls",
            }],
        });
        let out = map(payload.clone()).unwrap();

        assert_eq!(out.choices.as_ref().unwrap()[0].message.content, None);
        let serialized = serde_json::to_value(&out).unwrap();
        assert_eq!(serialized["choices"], payload["choices"]);
    }

    #[test]
    fn legacy_missing_fields_stay_absent() {
        let out = map(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "ok" } }],
        }))
        .unwrap();

        assert!(out.id.is_none());
        assert!(out.created.is_none(), "created must not be invented for legacy replies");
        assert!(out.usage.is_none());
        assert!(out.choices.unwrap()[0].finish_reason.is_none());
    }

    #[test]
    fn legacy_partial_usage_is_not_zero_filled() {
        let out = map(json!({
            "choices": [],
            "usage": { "prompt_tokens": 4 },
        }))
        .unwrap();
        let usage = out.usage.unwrap();
        assert_eq!(usage.prompt_tokens, Some(4));
        assert_eq!(usage.completion_tokens, None);
        assert_eq!(usage.total_tokens, None);
    }

    #[test]
    fn legacy_malformed_choice_is_a_mapping_error() {
        let err = map(json!({ "choices": [{ "index": 0 }] })).unwrap_err();
        assert!(matches!(err, GatewayError::Mapping(_)));
        assert!(err.to_string().contains("choices"), "{err}");
    }

    // -----------------------------------------------------------------------
    // OutputArray
    // -----------------------------------------------------------------------

    #[test]
    fn output_array_completed_maps_to_stop() {
        let out = map(json!({
            "status": "completed",
            "output": [{ "type": "message", "content": [{ "type": "output_text", "text": "hi" }] }],
        }))
        .unwrap();

        let choices = out.choices.unwrap();
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].index, 0);
        assert_eq!(choices[0].message, ReplyMessage::text("assistant", "hi"));
        assert_eq!(choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn output_array_other_statuses_map_to_length() {
        for status in ["incomplete", "in_progress", "failed", "something_new"] {
            let out = map(output_payload(
                status,
                json!([{ "type": "message", "content": [{ "type": "output_text", "text": "partial" }] }]),
            ))
            .unwrap();
            assert_eq!(
                out.choices.unwrap()[0].finish_reason.as_deref(),
                Some("length"),
                "status {status}"
            );
        }
    }

    #[test]
    fn output_array_missing_status_maps_to_length() {
        let out = map(json!({ "output": [] })).unwrap();
        assert_eq!(out.choices.unwrap()[0].finish_reason.as_deref(), Some("length"));
    }

    #[test]
    fn output_array_skips_reasoning_items_and_non_text_parts() {
        let out = map(output_payload(
            "completed",
            json!([
                { "type": "reasoning", "summary": [] },
                { "type": "message", "content": [
                    { "type": "refusal", "refusal": "no" },
                    { "type": "output_text", "text": "The answer is 4." },
                ]},
            ]),
        ))
        .unwrap();
        assert_eq!(out.choices.unwrap()[0].message.content.as_deref(), Some("The answer is 4."));
    }

    #[test]
    fn output_array_without_text_yields_empty_content_not_absent() {
        let out = map(output_payload(
            "completed",
            json!([{ "type": "function_call", "name": "get_weather", "arguments": "{}" }]),
        ))
        .unwrap();
        let choice = &out.choices.unwrap()[0];
        assert_eq!(choice.message.content.as_deref(), Some(""));

        let serialized = serde_json::to_value(choice).unwrap();
        assert_eq!(serialized["message"]["content"], "");
    }

    #[test]
    fn output_array_renames_usage_without_recomputing() {
        let out = map(json!({
            "status": "completed",
            "output": [],
            "usage": { "input_tokens": 7, "output_tokens": 5, "total_tokens": 100 },
        }))
        .unwrap();
        assert_eq!(
            out.usage.unwrap(),
            Usage {
                prompt_tokens: Some(7),
                completion_tokens: Some(5),
                total_tokens: Some(100),
            }
        );
    }

    #[test]
    fn output_array_zero_fills_each_missing_usage_count() {
        let out = map(json!({ "output": [], "usage": { "output_tokens": 3 } })).unwrap();
        assert_eq!(
            out.usage.unwrap(),
            Usage {
                prompt_tokens: Some(0),
                completion_tokens: Some(3),
                total_tokens: Some(0),
            }
        );

        let out = map(json!({ "output": [] })).unwrap();
        assert_eq!(out.usage.unwrap().prompt_tokens, Some(0));
    }

    #[test]
    fn output_array_keeps_native_creation_timestamp() {
        let mut payload = output_payload("completed", json!([]));
        payload["created_at"] = json!(1_741_000_000);
        assert_eq!(map(payload).unwrap().created, Some(1_741_000_000));
    }

    #[test]
    fn output_array_null_created_at_falls_back_to_created() {
        let mut payload = output_payload("completed", json!([]));
        payload["created_at"] = Value::Null;
        payload["created"] = json!(1_741_000_000);
        assert_eq!(map(payload).unwrap().created, Some(1_741_000_000));
    }

    #[test]
    fn output_array_substitutes_current_time_when_timestamp_missing() {
        let out = map(output_payload("completed", json!([]))).unwrap();
        assert_eq!(out.created, Some(FIXED_NOW));
    }

    #[test]
    fn output_array_real_clock_is_used_by_default() {
        let before = chrono::Utc::now().timestamp();
        let out = to_completion(&json!({ "status": "completed", "output": [] })).unwrap();
        let after = chrono::Utc::now().timestamp();
        let created = out.created.unwrap();
        assert!((before..=after).contains(&created));
    }

    #[test]
    fn output_array_passes_id_and_model_and_synthesizes_object() {
        let out = map(output_payload("completed", json!([]))).unwrap();
        assert_eq!(out.id.as_deref(), Some("resp_1"));
        assert_eq!(out.model.as_deref(), Some("gpt-4o-2024-08-06"));
        assert_eq!(out.object.as_deref(), Some(SYNTHESIZED_OBJECT));
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[test]
    fn unmarked_object_is_a_mapping_error_naming_its_keys() {
        let err = map(json!({ "text": "hi", "meta": {} })).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("mapping error: unrecognized payload shape"), "{msg}");
        assert!(msg.contains("text") && msg.contains("meta"), "{msg}");
    }

    #[test]
    fn non_object_is_a_mapping_error_naming_the_type() {
        let err = map(json!(["not", "an", "object"])).unwrap_err();
        assert!(err.to_string().contains("got array"), "{err}");
    }

    #[test]
    fn in_band_error_surfaces_upstream_message() {
        let err = map(json!({ "error": { "message": "Insufficient Balance", "type": "unknown_error" } }))
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Mapping("upstream reported an error: Insufficient Balance".into())
        );
    }

    // -----------------------------------------------------------------------
    // Passthrough
    // -----------------------------------------------------------------------

    #[test]
    fn passthrough_returns_response_field_when_present() {
        let out = to_passthrough(json!({ "response": { "text": "Sunny, 21°C" }, "runId": "r1" })).unwrap();
        assert_eq!(out, json!({ "text": "Sunny, 21°C" }));
    }

    #[test]
    fn passthrough_returns_whole_payload_without_response_field() {
        let payload = json!({ "text": "Sunny", "steps": [], "finishReason": "stop" });
        assert_eq!(to_passthrough(payload.clone()).unwrap(), payload);
    }

    #[test]
    fn passthrough_treats_null_response_as_absent() {
        let payload = json!({ "response": null, "text": "Sunny" });
        assert_eq!(to_passthrough(payload.clone()).unwrap(), payload);
    }

    #[test]
    fn passthrough_rejects_non_objects_and_in_band_errors() {
        assert!(to_passthrough(json!("plain text")).is_err());
        let err = to_passthrough(json!({ "error": "agent not found" })).unwrap_err();
        assert!(err.to_string().contains("agent not found"), "{err}");
    }
}
