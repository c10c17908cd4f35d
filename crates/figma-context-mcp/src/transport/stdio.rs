//! Stdio transport: reads JSON-RPC from stdin, writes to stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::ProtocolHandler;
use crate::session::{OutboundEvent, OutboundReceiver, PipeChannel};
use crate::types::{McpError, McpResult};

use super::framing;

/// Stdio transport for desktop MCP clients. Serves exactly one session.
pub struct StdioTransport {
    handler: ProtocolHandler,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self { handler }
    }

    /// Run the transport loop: reads from stdin, writes to stdout.
    pub async fn run(&self) -> McpResult<()> {
        self.run_with(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve one session over an arbitrary line reader and writer.
    ///
    /// Returns at end of input, after every queued message has been
    /// answered and flushed.
    pub async fn run_with<R, W>(&self, reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (channel, outbound) = PipeChannel::new();
        let session_id = self.handler.connect(Arc::new(channel)).await?;
        let writer_task = tokio::spawn(write_frames(outbound, writer));

        tracing::info!("Stdio transport started");

        let mut lines = reader.lines();
        let read_result = loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = self.handler.dispatch_message(&session_id, &line).await {
                        tracing::warn!("Stdout closed, stopping: {e}");
                        break Ok(());
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF on stdin, shutting down");
                    break Ok(());
                }
                Err(e) => break Err(McpError::Io(e)),
            }
        };

        self.handler.finish(&session_id).await;
        writer_task
            .await
            .map_err(|e| McpError::Transport(e.to_string()))??;

        read_result
    }
}

async fn write_frames<W>(mut outbound: OutboundReceiver, mut writer: W) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = outbound.recv().await {
        let OutboundEvent::Message(value) = event else {
            continue;
        };
        let framed = framing::frame_message(&value)?;
        writer.write_all(framed.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
