//! JSON-RPC envelope validation.

use crate::types::{JsonRpcMessage, McpError, McpResult, JSONRPC_VERSION};

/// Check the `jsonrpc` version and method of an inbound request or notification.
pub fn validate_message(message: &JsonRpcMessage) -> McpResult<()> {
    let (version, method) = match message {
        JsonRpcMessage::Request(r) => (r.jsonrpc.as_str(), r.method.as_str()),
        JsonRpcMessage::Notification(n) => (n.jsonrpc.as_str(), n.method.as_str()),
        JsonRpcMessage::Response(r) => (r.jsonrpc.as_str(), "response"),
        JsonRpcMessage::Error(e) => (e.jsonrpc.as_str(), "error"),
    };

    if version != JSONRPC_VERSION {
        return Err(McpError::InvalidRequest(format!(
            "Expected jsonrpc version \"{JSONRPC_VERSION}\", got \"{version}\""
        )));
    }

    if method.is_empty() {
        return Err(McpError::InvalidRequest(
            "Method name must not be empty".to_string(),
        ));
    }

    Ok(())
}
