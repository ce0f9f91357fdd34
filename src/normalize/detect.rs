//! Structural classification of upstream payloads.
//!
//! Detection only looks at which distinguishing fields are present. Upstreams
//! do not reliably declare a schema version, so nothing here reads one.

use serde_json::{Map, Value};

/// The closed set of payload shapes the gateway understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadFormat<'a> {
    /// Chat-completions shape: a top-level `choices` array.
    LegacyChoices(&'a Map<String, Value>),
    /// Responses shape: a top-level `output` array of typed items.
    OutputArray(&'a Map<String, Value>),
    /// A 2xx reply that carries an in-band `error` instead of data.
    ErrorReport(&'a Value),
    /// Any other object. Its layout belongs to the upstream.
    Passthrough(&'a Map<String, Value>),
    /// Not an object at all.
    Unrecognized(&'static str),
}

impl PayloadFormat<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LegacyChoices(_) => "legacy_choices",
            Self::OutputArray(_) => "output_array",
            Self::ErrorReport(_) => "error_report",
            Self::Passthrough(_) => "passthrough",
            Self::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Classify a parsed upstream payload.
///
/// `choices` wins over `output` when both are present, and either wins over
/// an `error` field.
pub fn detect(payload: &Value) -> PayloadFormat<'_> {
    let obj = match payload {
        Value::Object(obj) => obj,
        other => return PayloadFormat::Unrecognized(json_type(other)),
    };

    if obj.get("choices").is_some_and(Value::is_array) {
        PayloadFormat::LegacyChoices(obj)
    } else if obj.get("output").is_some_and(Value::is_array) {
        PayloadFormat::OutputArray(obj)
    } else if let Some(error) = obj.get("error").filter(|e| !e.is_null()) {
        PayloadFormat::ErrorReport(error)
    } else {
        PayloadFormat::Passthrough(obj)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
