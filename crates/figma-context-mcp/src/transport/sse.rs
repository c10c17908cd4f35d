//! SSE transport: one event stream per client, messages POSTed back with
//! the session id the stream announced.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json as AxumJson, Response},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::protocol::ProtocolHandler;
use crate::session::{OutboundEvent, StreamChannel};
use crate::types::{McpError, McpResult, RequestId};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Clone)]
struct AppState {
    handler: ProtocolHandler,
    base_path: String,
}

impl AppState {
    fn message_path(&self) -> String {
        format!("{}/messages", self.base_path)
    }
}

/// SSE transport for web-based MCP clients.
pub struct SseTransport {
    state: AppState,
}

impl SseTransport {
    /// `base_path` prefixes every route, e.g. `/api`. Empty serves at the root.
    pub fn new(handler: ProtocolHandler, base_path: &str) -> Self {
        Self {
            state: AppState {
                handler,
                base_path: normalize_base_path(base_path),
            },
        }
    }

    pub fn base_path(&self) -> &str {
        &self.state.base_path
    }

    pub fn router(&self) -> Router {
        let routes = Router::new()
            .route("/", get(handle_root))
            .route("/sse", get(handle_sse))
            .route("/messages", post(handle_messages))
            .route("/health", get(handle_health));

        let app = if self.state.base_path.is_empty() {
            routes
        } else {
            Router::new()
                .route("/", get(handle_root))
                .nest(&self.state.base_path, routes)
        };

        app.fallback(handle_fallback)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the HTTP server on the given address.
    pub async fn run(&self, addr: &str) -> McpResult<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(McpError::Io)?;

        tracing::info!(
            "HTTP transport listening on {addr} (SSE at {}/sse)",
            self.state.base_path
        );

        axum::serve(listener, self.router())
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?;

        Ok(())
    }
}

fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// GET /sse: open a session and stream its outbound events.
async fn handle_sse(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Response> {
    let (channel, mut outbound) = StreamChannel::new(&state.message_path());
    let session_id = state
        .handler
        .connect(Arc::new(channel))
        .await
        .map_err(|e| {
            tracing::error!("Failed to open SSE session: {e}");
            json_rpc_error(StatusCode::INTERNAL_SERVER_ERROR, &e)
        })?;

    tracing::info!("SSE client connected: {session_id}");

    // Dropping the stream (client gone) drops `outbound`, which closes the session.
    let stream = async_stream::stream! {
        while let Some(event) = outbound.recv().await {
            yield Ok::<Event, Infallible>(to_sse_event(event));
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}

fn to_sse_event(event: OutboundEvent) -> Event {
    match event {
        OutboundEvent::Endpoint(url) => Event::default().event("endpoint").data(url),
        OutboundEvent::Message(value) => Event::default().event("message").data(value.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// POST /messages?sessionId=: queue a message; the reply arrives on the stream.
async fn handle_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId query parameter").into_response();
    };

    match state.handler.dispatch_message(&session_id, &body).await {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(e @ McpError::NoActiveSession(_)) => {
            tracing::warn!("POST for unknown session {session_id}");
            json_rpc_error(StatusCode::NOT_FOUND, &e)
        }
        Err(e) => json_rpc_error(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

fn json_rpc_error(status: StatusCode, error: &McpError) -> Response {
    (status, AxumJson(error.to_json_rpc_error(RequestId::Null))).into_response()
}

async fn handle_health(State(state): State<AppState>) -> AxumJson<serde_json::Value> {
    AxumJson(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.handler.sessions().len().await,
    }))
}

async fn handle_root() -> &'static str {
    "Figma MCP Server is running!"
}

async fn handle_fallback(State(state): State<AppState>) -> String {
    format!(
        "Figma MCP Server API - Use {base}/sse for SSE connections and {base}/messages for messages",
        base = state.base_path
    )
}
