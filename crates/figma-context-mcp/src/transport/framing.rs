//! Message framing for newline-delimited JSON.

use serde_json::Value;

use crate::types::{JsonRpcMessage, JsonRpcRequest, McpError, McpResult};

/// Parse one frame (a stdin line or a POST body) as a JSON-RPC message.
///
/// Text that is not JSON is a parse error. JSON that is not a valid message,
/// including a request whose `id` is neither a string, an integer, nor null,
/// is an invalid request.
pub fn parse_message(line: &str) -> McpResult<JsonRpcMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))?;

    // A bad id must not demote a request to a notification.
    if value.get("id").is_some() && value.get("method").is_some() {
        return serde_json::from_value::<JsonRpcRequest>(value)
            .map(JsonRpcMessage::Request)
            .map_err(|e| McpError::InvalidRequest(e.to_string()));
    }

    serde_json::from_value(value).map_err(|e| McpError::InvalidRequest(e.to_string()))
}

/// Serialize a value to a JSON line (with trailing newline).
pub fn frame_message(value: &serde_json::Value) -> McpResult<String> {
    let mut json = serde_json::to_string(value).map_err(McpError::Json)?;
    json.push('\n');
    Ok(json)
}
