//! Protocol engine: owns the session table, queues inbound messages per
//! session, and routes JSON-RPC methods to the tool registry.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::session::{Inbound, OutboundEvent, Session, SessionChannel, SessionId, SessionTable};
use crate::tools::ToolRegistry;
use crate::transport::framing;
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_message;

/// Dispatches JSON-RPC messages for every open session.
///
/// Cheap to clone; clones share the registry and session table.
#[derive(Clone)]
pub struct ProtocolHandler {
    registry: Arc<ToolRegistry>,
    sessions: Arc<SessionTable>,
}

impl ProtocolHandler {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            sessions: Arc::new(SessionTable::new()),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Open `channel`, register it, and start its worker.
    ///
    /// A session already registered under the same id is superseded: its
    /// channel is closed and its worker stops.
    pub async fn connect(&self, channel: Arc<dyn SessionChannel>) -> McpResult<SessionId> {
        channel.open()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(self.clone().run_session(channel.clone(), rx));
        let session = Arc::new(Session::new(channel.clone(), tx, worker));
        let id = session.id().to_string();

        if let Some(prior) = self.sessions.insert(session.clone()).await {
            tracing::warn!("Session {id} superseded by a new connection");
            prior.channel().close();
        }

        let sessions = self.sessions.clone();
        let outbound = channel.outbound().clone();
        let weak = Arc::downgrade(&session);
        let watched = id.clone();
        tokio::spawn(async move {
            outbound.closed().await;
            if sessions.remove_if_same(&watched, &weak).await {
                tracing::info!("Session {watched} closed");
            }
        });

        tracing::info!("Session {id} opened ({:?})", channel.kind());
        Ok(id)
    }

    /// Close a session immediately. Queued messages are dropped.
    pub async fn disconnect(&self, id: &str) -> bool {
        match self.sessions.remove(id).await {
            Some(session) => {
                session.channel().close();
                tracing::info!("Session {id} disconnected");
                true
            }
            None => false,
        }
    }

    /// Stop accepting messages for `id`, let already-queued ones complete,
    /// then close the channel.
    pub async fn finish(&self, id: &str) {
        let Some(session) = self.sessions.remove(id).await else {
            return;
        };
        let channel = session.channel().clone();
        let worker = session.take_worker();
        // Dropping the last handle drops the inbound sender, so the worker
        // drains its queue and exits.
        drop(session);

        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::warn!("Session {id} worker ended abnormally: {e}");
            }
        }
        channel.close();
        tracing::info!("Session {id} finished");
    }

    /// Queue one raw message for `id`. Returns once queued, not once handled.
    ///
    /// A body that fails to parse is still queued and answered on the
    /// session with a parse error.
    pub async fn dispatch_message(&self, id: &str, raw: &str) -> McpResult<()> {
        let item = match framing::parse_message(raw) {
            Ok(msg) => Inbound::Message(msg),
            Err(e) => {
                tracing::warn!("Parse error on session {id}: {e}");
                Inbound::Malformed(e)
            }
        };
        self.sessions
            .with_open(id, |session| session.enqueue(item))
            .await
    }

    async fn run_session(
        self,
        channel: Arc<dyn SessionChannel>,
        mut inbox: mpsc::UnboundedReceiver<Inbound>,
    ) {
        let mut caps = NegotiatedCapabilities::default();

        loop {
            let item = tokio::select! {
                biased;
                item = inbox.recv() => match item {
                    Some(item) => item,
                    None => break,
                },
                _ = channel.outbound().closed() => break,
            };

            // Closed while idle or mid-call: whatever is still queued is dropped.
            if channel.is_closed() {
                tracing::debug!("Dropping queued messages for closed session {}", channel.id());
                break;
            }

            let reply = match item {
                Inbound::Message(msg) => self.handle_message(&mut caps, msg).await,
                Inbound::Malformed(e) => {
                    serde_json::to_value(e.to_json_rpc_error(RequestId::Null)).ok()
                }
            };

            if let Some(reply) = reply {
                if let Err(e) = channel.send(OutboundEvent::Message(reply)) {
                    tracing::debug!("Discarding result for session {}: {e}", channel.id());
                }
            }
        }

        tracing::debug!("Session {} worker stopped", channel.id());
    }

    /// Handle one decoded message. Requests produce a response value;
    /// notifications and stray responses produce nothing.
    pub async fn handle_message(
        &self,
        caps: &mut NegotiatedCapabilities,
        msg: JsonRpcMessage,
    ) -> Option<Value> {
        if let Err(e) = validate_message(&msg) {
            return match msg {
                JsonRpcMessage::Request(req) => {
                    serde_json::to_value(e.to_json_rpc_error(req.id)).ok()
                }
                _ => {
                    tracing::warn!("Dropping invalid message: {e}");
                    None
                }
            };
        }

        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(caps, req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(caps, notif);
                None
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    async fn handle_request(
        &self,
        caps: &mut NegotiatedCapabilities,
        request: JsonRpcRequest,
    ) -> Value {
        let id = request.id.clone();
        let result = self.dispatch_request(caps, request).await;

        let encoded = match result {
            Ok(value) => serde_json::to_value(JsonRpcResponse::new(id.clone(), value)),
            Err(e) => serde_json::to_value(e.to_json_rpc_error(id.clone())),
        };
        encoded.unwrap_or_else(|e| {
            let fallback = McpError::InternalError(e.to_string()).to_json_rpc_error(id);
            serde_json::to_value(fallback).unwrap_or(Value::Null)
        })
    }

    async fn dispatch_request(
        &self,
        caps: &mut NegotiatedCapabilities,
        request: JsonRpcRequest,
    ) -> McpResult<Value> {
        match request.method.as_str() {
            "initialize" => {
                let params: InitializeParams = decode_params(request.params, "Initialize")?;
                Ok(serde_json::to_value(caps.negotiate(params))?)
            }
            "ping" => Ok(Value::Object(serde_json::Map::new())),
            "tools/list" => {
                let result = ToolListResult {
                    tools: self.registry.list_tools(),
                    next_cursor: None,
                };
                Ok(serde_json::to_value(result)?)
            }
            "tools/call" => {
                let call: ToolCallParams = decode_params(request.params, "Tool call")?;
                Ok(serde_json::to_value(self.invoke(call).await)?)
            }
            "shutdown" => {
                tracing::info!("Shutdown requested");
                Ok(Value::Object(serde_json::Map::new()))
            }
            _ => Err(McpError::MethodNotFound(request.method.clone())),
        }
    }

    fn handle_notification(
        &self,
        caps: &mut NegotiatedCapabilities,
        notification: JsonRpcNotification,
    ) {
        match notification.method.as_str() {
            "initialized" | "notifications/initialized" => caps.mark_initialized(),
            "notifications/cancelled" => {
                let params = notification
                    .params
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
                match params {
                    Some(p) => tracing::info!(
                        "Client cancelled request {}: {}",
                        p.request_id,
                        p.reason.as_deref().unwrap_or("no reason given")
                    ),
                    None => tracing::info!("Received cancellation notification"),
                }
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    /// Resolve, validate, and run one tool call. Every tool-level failure
    /// comes back as an error result rather than a protocol error.
    pub async fn invoke(&self, call: ToolCallParams) -> ToolCallResult {
        let tool = match self.registry.resolve(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                tracing::warn!("{e}");
                return ToolCallResult::error(e.to_string());
            }
        };

        let args = call
            .arguments
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        if let Err(e) = tool.schema.validate(&args) {
            tracing::warn!("Rejected call to {}: {e}", tool.name);
            return ToolCallResult::error(e.to_string());
        }

        tracing::info!("Calling tool {}", tool.name);
        let handler = tool.handler.clone();
        match tokio::spawn(async move { handler.call(args).await }).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!("Tool {} failed: {e}", tool.name);
                ToolCallResult::error(e.to_string())
            }
            Err(e) => {
                tracing::error!("Tool {} task failed: {e}", tool.name);
                ToolCallResult::error(format!("Tool '{}' panicked", tool.name))
            }
        }
    }
}

fn decode_params<T: serde::de::DeserializeOwned>(
    params: Option<Value>,
    what: &str,
) -> McpResult<T> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams(format!("{what} params required")))
}
