//! Session channels: one logical duplex connection to a single client.
//!
//! Every channel owns an [`Outbound`] queue. `send` only enqueues, so a slow
//! client never stalls the engine; the carrier drains the queue on its own
//! task through the matching [`OutboundReceiver`].

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::types::{McpError, McpResult};

/// Opaque correlation key for a session.
pub type SessionId = String;

/// Something written to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// Handshake telling an SSE client where to POST its messages.
    Endpoint(String),
    /// A JSON-RPC response or notification.
    Message(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Host process stdin/stdout.
    Pipe,
    /// One long-lived HTTP event stream.
    Stream,
}

/// Sending half of a channel's outbound queue.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<OutboundEvent>,
    cancel: CancellationToken,
}

/// Draining half, owned by the carrier's writer.
#[derive(Debug)]
pub struct OutboundReceiver {
    rx: mpsc::UnboundedReceiver<OutboundEvent>,
    cancel: CancellationToken,
}

impl Outbound {
    pub fn channel() -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        (
            Self {
                tx,
                cancel: cancel.clone(),
            },
            OutboundReceiver { rx, cancel },
        )
    }

    pub fn send(&self, event: OutboundEvent) -> McpResult<()> {
        if self.is_closed() {
            return Err(McpError::ChannelClosed);
        }
        self.tx.send(event).map_err(|_| McpError::ChannelClosed)
    }

    /// Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Closed locally, or the receiver was dropped (client went away).
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves once the channel is closed from either side.
    pub async fn closed(&self) {
        tokio::select! {
            _ = self.tx.closed() => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}

impl OutboundReceiver {
    /// Next queued event. After `close`, already-queued events are still
    /// delivered, then `None`.
    pub async fn recv(&mut self) -> Option<OutboundEvent> {
        tokio::select! {
            biased;
            event = self.rx.recv() => return event,
            _ = self.cancel.cancelled() => {}
        }
        self.rx.try_recv().ok()
    }
}

/// Capability set shared by every carrier.
pub trait SessionChannel: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> ChannelKind;

    fn outbound(&self) -> &Outbound;

    /// Write whatever handshake the carrier needs.
    fn open(&self) -> McpResult<()> {
        Ok(())
    }

    fn send(&self, event: OutboundEvent) -> McpResult<()> {
        self.outbound().send(event)
    }

    fn close(&self) {
        self.outbound().close();
    }

    fn is_closed(&self) -> bool {
        self.outbound().is_closed()
    }
}

/// Channel bound to the host process's stdin/stdout.
pub struct PipeChannel {
    id: SessionId,
    outbound: Outbound,
}

impl PipeChannel {
    pub fn new() -> (Self, OutboundReceiver) {
        let (outbound, rx) = Outbound::channel();
        let channel = Self {
            id: uuid::Uuid::new_v4().to_string(),
            outbound,
        };
        (channel, rx)
    }
}

impl SessionChannel for PipeChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Pipe
    }

    fn outbound(&self) -> &Outbound {
        &self.outbound
    }
}

/// Channel bound to one HTTP event-stream response.
pub struct StreamChannel {
    id: SessionId,
    outbound: Outbound,
    message_path: String,
}

impl StreamChannel {
    /// `message_path` is where the client must POST, e.g. `/messages`.
    pub fn new(message_path: &str) -> (Self, OutboundReceiver) {
        let (outbound, rx) = Outbound::channel();
        let channel = Self {
            id: uuid::Uuid::new_v4().to_string(),
            outbound,
            message_path: message_path.to_string(),
        };
        (channel, rx)
    }

    /// URL the client attaches to every message, carrying the session id.
    pub fn endpoint(&self) -> String {
        format!("{}?sessionId={}", self.message_path, self.id)
    }
}

impl SessionChannel for StreamChannel {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ChannelKind {
        ChannelKind::Stream
    }

    fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    fn open(&self) -> McpResult<()> {
        self.outbound.send(OutboundEvent::Endpoint(self.endpoint()))
    }
}
