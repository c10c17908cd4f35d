//! Figma MCP Server: entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use figma_context::{DesignFileClient, FigmaService};
use figma_context_mcp::config::{
    resolve_api_key, resolve_port, resolve_transport_mode, TransportMode,
};
use figma_context_mcp::protocol::ProtocolHandler;
use figma_context_mcp::tools::ToolRegistry;
use figma_context_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "figma-context-mcp",
    about = "MCP server exposing Figma design data to LLM clients",
    version
)]
struct Cli {
    /// Figma personal access token. Also reads FIGMA_API_KEY.
    #[arg(long, global = true)]
    figma_api_key: Option<String>,

    /// HTTP port. Also reads PORT; defaults to 3333.
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Serve over stdin/stdout instead of HTTP.
    #[arg(long)]
    stdio: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio.
    Serve,

    /// Start MCP server over HTTP with SSE.
    #[cfg(feature = "sse")]
    ServeHttp {
        /// Listen address (host:port). Overrides --port.
        #[arg(long)]
        addr: Option<String>,

        /// Prefix for every route, e.g. /api.
        #[arg(long, default_value = "")]
        base_path: String,
    },

    /// Print server capabilities and tools as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   figma-context-mcp completions bash > ~/.local/share/bash-completion/completions/figma-context-mcp
    ///   figma-context-mcp completions zsh > ~/.zfunc/_figma-context-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn build_handler(api_key: Option<&str>) -> anyhow::Result<ProtocolHandler> {
    let api_key = resolve_api_key(api_key)?;
    let client: Arc<dyn DesignFileClient> = Arc::new(FigmaService::new(api_key));
    let registry = ToolRegistry::figma(client)?;
    Ok(ProtocolHandler::new(registry))
}

async fn serve_stdio(api_key: Option<&str>) -> anyhow::Result<()> {
    let handler = build_handler(api_key)?;
    tracing::info!("Figma MCP server (stdio)");
    StdioTransport::new(handler).run().await?;
    Ok(())
}

#[cfg(feature = "sse")]
async fn serve_http(api_key: Option<&str>, addr: String, base_path: &str) -> anyhow::Result<()> {
    use figma_context_mcp::transport::SseTransport;

    let handler = build_handler(api_key)?;
    tracing::info!("Figma MCP server (HTTP)");
    SseTransport::new(handler, base_path).run(&addr).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    // stdout carries the JSON-RPC pipe in stdio mode.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let api_key = cli.figma_api_key.as_deref();

    match cli.command {
        Some(Commands::Serve) => serve_stdio(api_key).await?,

        #[cfg(feature = "sse")]
        Some(Commands::ServeHttp { addr, base_path }) => {
            let addr = addr.unwrap_or_else(|| format!("0.0.0.0:{}", resolve_port(cli.port)));
            serve_http(api_key, addr, &base_path).await?;
        }

        Some(Commands::Info) => {
            let capabilities = figma_context_mcp::types::InitializeResult::default_result();
            let client: Arc<dyn DesignFileClient> = Arc::new(FigmaService::new(""));
            let tools = ToolRegistry::figma(client)?.list_tools();
            let tool_count = tools.len();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools,
                "tool_count": tool_count,
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                shell,
                &mut cmd,
                "figma-context-mcp",
                &mut std::io::stdout(),
            );
        }

        None => match resolve_transport_mode(cli.stdio) {
            TransportMode::Stdio => serve_stdio(api_key).await?,
            TransportMode::Http => {
                #[cfg(feature = "sse")]
                {
                    let addr = format!("0.0.0.0:{}", resolve_port(cli.port));
                    serve_http(api_key, addr, "").await?;
                }
                #[cfg(not(feature = "sse"))]
                anyhow::bail!("HTTP transport requires the `sse` feature; pass --stdio");
            }
        },
    }

    Ok(())
}
