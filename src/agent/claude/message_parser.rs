//! Message parser for Claude CLI output.
//!
//! Maps messages from the CLI's `stream-json` output onto [`ResponseUnit`]s.
//! Only assistant text and the terminal result are surfaced; tool traffic,
//! system notices and partial stream events are skipped.

use crate::error::{Error, Result};
use crate::types::ResponseUnit;
use serde_json::Value;

/// Parse one JSON message from Claude CLI output.
///
/// Returns `Ok(None)` for messages that carry nothing to show and for
/// unrecognized message types (forward compatibility).
///
/// # Errors
///
/// Returns [`Error::Stream`] if the message is malformed.
pub fn parse_message(data: &Value) -> Result<Option<ResponseUnit>> {
    let obj = data.as_object().ok_or_else(|| {
        Error::Stream(format!(
            "Invalid message data type (expected object, got {})",
            type_name(data)
        ))
    })?;

    let message_type = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Stream("Message missing 'type' field".to_string()))?;

    match message_type {
        "assistant" => parse_assistant_message(obj),
        "result" => parse_result_message(obj),
        "user" | "system" | "stream_event" | "control_request" | "control_response" => {
            tracing::trace!("Skipping {} message", message_type);
            Ok(None)
        }
        _ => {
            tracing::debug!("Skipping unknown message type: {}", message_type);
            Ok(None)
        }
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_assistant_message(obj: &serde_json::Map<String, Value>) -> Result<Option<ResponseUnit>> {
    let content = obj
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::Stream("Assistant message missing 'content' array".to_string()))?;

    let texts: Vec<&str> = content
        .iter()
        .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
        .collect();

    if texts.is_empty() {
        return Ok(None);
    }
    Ok(Some(ResponseUnit::partial(texts.join("\n"))))
}

fn parse_result_message(obj: &serde_json::Map<String, Value>) -> Result<Option<ResponseUnit>> {
    let subtype = obj
        .get("subtype")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Stream("Result message missing 'subtype' field".to_string()))?;
    let is_error = obj
        .get("is_error")
        .and_then(|v| v.as_bool())
        .unwrap_or(subtype != "success");

    // Error results such as `error_max_turns` carry no text; report the subtype.
    let text = match obj.get("result").and_then(|v| v.as_str()) {
        Some(text) => text.to_string(),
        None if is_error => subtype.to_string(),
        None => String::new(),
    };

    Ok(Some(ResponseUnit::Final {
        text,
        is_error,
        session_id: obj
            .get("session_id")
            .and_then(|v| v.as_str())
            .map(String::from),
        total_cost_usd: obj.get("total_cost_usd").and_then(|v| v.as_f64()),
    }))
}
