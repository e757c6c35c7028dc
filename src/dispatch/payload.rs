//! Parse-and-validate boundary for tool payloads.
//!
//! A tool result's `content` is a string holding JSON, which for some tools
//! is itself a `[status, detail]` tuple. Nothing here panics.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("payload is empty")]
    Empty,

    #[error("expected a [status, detail] pair, got {0}")]
    NotATuple(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

/// Decode `content`. Strings are parsed as JSON; values that already arrived
/// structured are taken as they are.
pub fn parse_content(content: &Value) -> Result<Value, PayloadError> {
    match content {
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(PayloadError::Empty);
            }
            Ok(serde_json::from_str(raw)?)
        }
        Value::Null => Err(PayloadError::Empty),
        other => Ok(other.clone()),
    }
}

/// Split the two-element tuple convention into `(status, detail)`.
pub fn as_tuple(payload: &Value) -> Result<(&Value, &Value), PayloadError> {
    match payload.as_array().map(Vec::as_slice) {
        Some([status, detail]) => Ok((status, detail)),
        _ => Err(PayloadError::NotATuple(describe(payload))),
    }
}

/// Look up a field, accepting a camelCase or snake_case spelling.
pub fn field<'a>(value: &'a Value, camel: &str, snake: &str) -> Option<&'a Value> {
    value
        .get(camel)
        .or_else(|| value.get(snake))
        .filter(|v| !v.is_null())
}

fn describe(value: &Value) -> String {
    match value {
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(_) => "object".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Null => "null".to_string(),
    }
}
