//! Figma MCP Server: exposes Figma design data to LLM clients over stdio or HTTP/SSE.

pub mod config;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::{resolve_api_key, resolve_port, resolve_transport_mode, TransportMode};
pub use protocol::ProtocolHandler;
pub use session::SessionTable;
pub use tools::ToolRegistry;
pub use transport::StdioTransport;
