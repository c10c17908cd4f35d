//! Shared fixtures: a scripted design-file client and JSON-RPC helpers.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use figma_context::{
    DesignFileClient, FigmaError, FigmaResult, GlobalVars, ImageFormat, SimplifiedDesign,
    SimplifiedNode,
};
use figma_context_mcp::protocol::ProtocolHandler;
use figma_context_mcp::session::{OutboundEvent, OutboundReceiver, PipeChannel};
use figma_context_mcp::tools::ToolRegistry;

/// Records every call; designs are named after their file key.
#[derive(Default)]
pub struct FakeClient {
    pub calls: Mutex<Vec<String>>,
    /// Node ids whose render yields no image.
    pub unrendered: HashSet<String>,
    /// Node ids whose render returns an error.
    pub erroring: HashSet<String>,
    /// Per-file-key latency.
    pub delays: HashMap<String, Duration>,
}

impl FakeClient {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn design(&self, file_key: &str) -> SimplifiedDesign {
        if let Some(delay) = self.delays.get(file_key) {
            tokio::time::sleep(*delay).await;
        }
        SimplifiedDesign {
            name: file_key.to_string(),
            last_modified: "2024-05-01T10:00:00Z".to_string(),
            thumbnail_url: format!("https://example.com/{file_key}.png"),
            nodes: vec![SimplifiedNode {
                id: "0:1".to_string(),
                name: "Page 1".to_string(),
                node_type: "CANVAS".to_string(),
                text: None,
                bounding_box: None,
                fills: Some("fill_1".to_string()),
                strokes: None,
                opacity: None,
                border_radius: None,
                children: None,
            }],
            global_vars: GlobalVars {
                styles: [("fill_1".to_string(), json!([{ "type": "SOLID" }]))]
                    .into_iter()
                    .collect(),
            },
        }
    }
}

#[async_trait]
impl DesignFileClient for FakeClient {
    async fn get_file(&self, file_key: &str, depth: Option<u32>) -> FigmaResult<SimplifiedDesign> {
        self.record(format!("get_file {file_key} {depth:?}"));
        if file_key == "missing" {
            return Err(FigmaError::Api {
                status: 404,
                message: "Not found".to_string(),
            });
        }
        Ok(self.design(file_key).await)
    }

    async fn get_node(
        &self,
        file_key: &str,
        node_id: &str,
        depth: Option<u32>,
    ) -> FigmaResult<SimplifiedDesign> {
        self.record(format!("get_node {file_key} {node_id} {depth:?}"));
        Ok(self.design(file_key).await)
    }

    async fn get_image(
        &self,
        file_key: &str,
        node_id: &str,
        file_name: &str,
        _local_path: &Path,
        format: ImageFormat,
    ) -> FigmaResult<bool> {
        self.record(format!("get_image {file_key} {node_id} {file_name} {format}"));
        if self.erroring.contains(node_id) {
            return Err(FigmaError::NodeNotFound(node_id.to_string()));
        }
        Ok(!self.unrendered.contains(node_id))
    }
}

pub fn handler_with(client: Arc<FakeClient>) -> ProtocolHandler {
    ProtocolHandler::new(ToolRegistry::figma(client).unwrap())
}

/// Connect a fresh pipe session and return its id and outbound queue.
pub async fn open_session(handler: &ProtocolHandler) -> (String, OutboundReceiver) {
    let (channel, rx) = PipeChannel::new();
    let id = handler.connect(Arc::new(channel)).await.unwrap();
    (id, rx)
}

pub fn request(id: i64, method: &str, params: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string()
}

pub fn tool_call(id: i64, name: &str, arguments: Value) -> String {
    request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
}

/// Next JSON-RPC message on a session, failing the test after five seconds.
pub async fn next_message(rx: &mut OutboundReceiver) -> Value {
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a reply")
        .expect("channel closed");
    match event {
        OutboundEvent::Message(value) => value,
        other => panic!("expected a message, got {other:?}"),
    }
}

/// Assert nothing more arrives within a short window.
pub async fn assert_quiet(rx: &mut OutboundReceiver) {
    let next = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(next.is_err(), "unexpected message: {next:?}");
}

/// Text of the first content block of a `tools/call` reply.
pub fn result_text(reply: &Value) -> &str {
    reply["result"]["content"][0]["text"].as_str().unwrap()
}

pub fn is_error(reply: &Value) -> bool {
    reply["result"]["isError"].as_bool().unwrap_or(false)
}
