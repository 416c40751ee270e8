//! JSON message envelope
//!
//! Messages leave and enter the process as JSON objects stamped with their
//! content language and encoding. Only `json` / `utf-8` are understood; the
//! comparison is case-insensitive.

use crate::message::Message;
use scaf_core::EnvelopeError;
use serde_json::Value;

/// Content language written into every envelope
pub const LANGUAGE: &str = "json";

/// Content encoding written into every envelope
pub const ENCODING: &str = "utf-8";

/// Serialize a message into an envelope
pub fn to_json(message: &Message) -> Result<String, EnvelopeError> {
    let mut value = serde_json::to_value(message)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| EnvelopeError::Malformed("message did not serialize to an object".into()))?;
    object.insert("language".into(), Value::String(LANGUAGE.into()));
    object.insert("encoding".into(), Value::String(ENCODING.into()));
    Ok(serde_json::to_string(&value)?)
}

/// Parse an envelope into a message
pub fn from_json(text: &str) -> Result<Message, EnvelopeError> {
    let value: Value = serde_json::from_str(text)?;

    if !field_matches(&value, "language", LANGUAGE) {
        return Err(EnvelopeError::Language { expected: LANGUAGE });
    }
    if !field_matches(&value, "encoding", ENCODING) {
        return Err(EnvelopeError::Encoding { expected: ENCODING });
    }

    Ok(serde_json::from_value(value)?)
}

fn field_matches(value: &Value, field: &str, expected: &str) -> bool {
    value
        .get(field)
        .and_then(Value::as_str)
        .map_or(false, |found| found.eq_ignore_ascii_case(expected))
}
