//! Configuration loading and resolution.
//!
//! Every setting resolves in the same order: explicit CLI value, then
//! environment, then default.

use crate::types::{McpError, McpResult};

pub const DEFAULT_PORT: u16 = 3333;

/// Which binding the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Stdio,
    Http,
}

/// Resolve the Figma API key from `--figma-api-key` or `FIGMA_API_KEY`.
pub fn resolve_api_key(explicit: Option<&str>) -> McpResult<String> {
    api_key_from(explicit, std::env::var("FIGMA_API_KEY").ok().as_deref())
}

fn api_key_from(explicit: Option<&str>, env: Option<&str>) -> McpResult<String> {
    explicit
        .or(env)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            McpError::Config(
                "FIGMA_API_KEY is required (via CLI argument --figma-api-key \
                 or the FIGMA_API_KEY environment variable)"
                    .to_string(),
            )
        })
}

/// Resolve the HTTP port from `--port` or `PORT`, defaulting to 3333.
pub fn resolve_port(explicit: Option<u16>) -> u16 {
    port_from(explicit, std::env::var("PORT").ok().as_deref())
}

fn port_from(explicit: Option<u16>, env: Option<&str>) -> u16 {
    if let Some(port) = explicit {
        return port;
    }
    match env.map(|raw| raw.trim().parse::<u16>()) {
        Some(Ok(port)) => port,
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid PORT value: {e}");
            DEFAULT_PORT
        }
        None => DEFAULT_PORT,
    }
}

/// Stdio when `--stdio` is set or the environment asks for it
/// (`MCP_TRANSPORT=stdio`, or `NODE_ENV=cli` from older launch configs).
pub fn resolve_transport_mode(stdio_flag: bool) -> TransportMode {
    transport_mode_from(
        stdio_flag,
        std::env::var("MCP_TRANSPORT").ok().as_deref(),
        std::env::var("NODE_ENV").ok().as_deref(),
    )
}

fn transport_mode_from(
    stdio_flag: bool,
    mcp_transport: Option<&str>,
    node_env: Option<&str>,
) -> TransportMode {
    let env_stdio = mcp_transport.is_some_and(|v| v.eq_ignore_ascii_case("stdio"))
        || node_env.is_some_and(|v| v.eq_ignore_ascii_case("cli"));
    if stdio_flag || env_stdio {
        TransportMode::Stdio
    } else {
        TransportMode::Http
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_prefers_explicit() {
        assert_eq!(api_key_from(Some("cli"), Some("env")).unwrap(), "cli");
        assert_eq!(api_key_from(None, Some("env")).unwrap(), "env");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        assert!(matches!(api_key_from(None, None), Err(McpError::Config(_))));
        assert!(matches!(api_key_from(Some("  "), None), Err(McpError::Config(_))));

        let message = api_key_from(None, None).unwrap_err().to_string();
        assert!(message.contains("--figma-api-key"), "{message}");
        assert!(message.contains("environment variable"), "{message}");
        assert!(!message.contains(".env"), "{message}");
    }

    #[test]
    fn test_port_resolution() {
        assert_eq!(port_from(Some(8080), Some("9000")), 8080);
        assert_eq!(port_from(None, Some("9000")), 9000);
        assert_eq!(port_from(None, Some("not-a-port")), DEFAULT_PORT);
        assert_eq!(port_from(None, None), DEFAULT_PORT);
    }

    #[test]
    fn test_transport_mode() {
        assert_eq!(transport_mode_from(true, None, None), TransportMode::Stdio);
        assert_eq!(transport_mode_from(false, Some("stdio"), None), TransportMode::Stdio);
        assert_eq!(transport_mode_from(false, None, Some("cli")), TransportMode::Stdio);
        assert_eq!(transport_mode_from(false, Some("http"), Some("production")), TransportMode::Http);
        assert_eq!(transport_mode_from(false, None, None), TransportMode::Http);
    }
}
