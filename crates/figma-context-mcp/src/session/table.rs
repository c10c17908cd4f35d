//! The table of open sessions, keyed by session id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use crate::types::{JsonRpcMessage, McpError, McpResult};

use super::channel::{SessionChannel, SessionId};

/// Work item for a session's dispatch worker.
#[derive(Debug)]
pub enum Inbound {
    Message(JsonRpcMessage),
    /// A body that failed to decode; answered in order with a parse error.
    Malformed(McpError),
}

/// Server-side record of one open channel.
pub struct Session {
    id: SessionId,
    channel: Arc<dyn SessionChannel>,
    inbound: mpsc::UnboundedSender<Inbound>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(
        channel: Arc<dyn SessionChannel>,
        inbound: mpsc::UnboundedSender<Inbound>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            id: channel.id().to_string(),
            channel,
            inbound,
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel(&self) -> &Arc<dyn SessionChannel> {
        &self.channel
    }

    pub fn is_open(&self) -> bool {
        !self.channel.is_closed()
    }

    /// Queue work for the session's worker.
    pub fn enqueue(&self, item: Inbound) -> McpResult<()> {
        self.inbound
            .send(item)
            .map_err(|_| McpError::NoActiveSession(self.id.clone()))
    }

    /// Take the worker handle; `None` once taken.
    pub fn take_worker(&self) -> Option<JoinHandle<()>> {
        self.worker.lock().ok().and_then(|mut guard| guard.take())
    }
}

/// Open sessions. Reads (dispatch) share the lock; connect and close take it exclusively,
/// so a channel closing cannot race a message being dispatched against it.
#[derive(Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, returning the one it superseded under the same id.
    pub async fn insert(&self, session: Arc<Session>) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.write().await.remove(id)
    }

    /// Remove `id` only if it still maps to `session` (not a newer one under the same id).
    pub async fn remove_if_same(&self, id: &str, session: &Weak<Session>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(id) {
            Some(current) if std::ptr::eq(Arc::as_ptr(current), session.as_ptr()) => {
                sessions.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Run `f` against an open session while holding the read lock.
    pub async fn with_open<R>(
        &self,
        id: &str,
        f: impl FnOnce(&Session) -> McpResult<R>,
    ) -> McpResult<R> {
        let sessions = self.sessions.read().await;
        match sessions.get(id) {
            Some(session) if session.is_open() => f(session),
            _ => Err(McpError::NoActiveSession(id.to_string())),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().cloned().collect()
    }
}
