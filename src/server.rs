use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};

use crate::config::ServerConfig;
use crate::dispatch;
use crate::tools::ToolRegistry;
use crate::transport::{self, Frame};

/// MCP server that communicates over stdio using newline-delimited JSON-RPC 2.0.
pub struct McpServer {
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: ToolRegistry::new(&config),
        }
    }

    /// Serve standard input/output until standard input is exhausted.
    pub async fn run(&self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Read-dispatch-write loop over an arbitrary pipe.
    ///
    /// Each response is written before the next line is read. Blank and
    /// malformed lines produce no output; only end-of-stream ends the loop.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut raw = Vec::new();

        loop {
            let message = match transport::read_frame(&mut reader, &mut raw).await? {
                Frame::Eof => break,
                Frame::Blank => continue,
                Frame::Malformed(reason) => {
                    tracing::warn!("skipping malformed line: {reason}");
                    continue;
                }
                Frame::Message(value) => value,
            };

            if let Some(resp) = dispatch::dispatch(message, &self.registry).await {
                transport::write_frame(&mut writer, &resp).await?;
            }
        }

        tracing::debug!("input closed, shutting down");
        Ok(())
    }
}
