// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! MCP transport abstraction (stdio and in-process buffers).
//!
//! Messages are newline-delimited JSON: one JSON-RPC message per line, no
//! embedded newlines. In stdio mode stdout carries protocol traffic only.

use crate::mcp::handlers::McpHandler;
use crate::mcp::protocol::{JsonRpcError, JsonRpcId, JsonRpcRequest, JsonRpcResponse};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Channel closed")]
    ChannelClosed,
}

/// Transport abstraction for MCP JSON-RPC messages.
#[async_trait::async_trait]
pub trait McpTransport: Send {
    /// Receive a JSON-RPC request. `ChannelClosed` marks a clean end of input.
    async fn recv(&mut self) -> Result<JsonRpcRequest, TransportError>;
    /// Send a JSON-RPC response.
    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError>;
}

/// Line-delimited JSON over any async reader/writer pair
pub struct LineTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    line: Vec<u8>,
}

/// Stdio transport
pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        LineTransport::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            line: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl<R, W> McpTransport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<JsonRpcRequest, TransportError> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line).await? == 0 {
                return Err(TransportError::ChannelClosed);
            }
            let trimmed = std::str::from_utf8(&self.line)?.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(trimmed)?;
            return serde_json::from_value(value)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()));
        }
    }

    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError> {
        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        self.writer.write_all(&payload).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Channel-backed transport for tests and in-process use.
pub struct BufferTransport {
    input: mpsc::Receiver<JsonRpcRequest>,
    output: mpsc::Sender<JsonRpcResponse>,
}

impl BufferTransport {
    pub fn new(input: mpsc::Receiver<JsonRpcRequest>, output: mpsc::Sender<JsonRpcResponse>) -> Self {
        Self { input, output }
    }
}

#[async_trait::async_trait]
impl McpTransport for BufferTransport {
    async fn recv(&mut self) -> Result<JsonRpcRequest, TransportError> {
        self.input.recv().await.ok_or(TransportError::ChannelClosed)
    }

    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError> {
        self.output
            .send(response)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Serve requests from `transport` until its input ends.
///
/// Requests are handled one at a time in arrival order. A line that is not
/// valid UTF-8 JSON-RPC is answered with an error and the loop continues.
pub async fn serve_transport<T: McpTransport>(
    handler: &McpHandler,
    transport: &mut T,
) -> Result<(), TransportError> {
    loop {
        let error = match transport.recv().await {
            Ok(request) => {
                if let Some(response) = handler.handle_request(request).await {
                    transport.send(response).await?;
                }
                continue;
            }
            Err(TransportError::ChannelClosed) => {
                debug!("Transport input closed");
                return Ok(());
            }
            Err(TransportError::Json(e)) => {
                JsonRpcError::parse_error(format!("Invalid JSON: {}", e))
            }
            Err(TransportError::Utf8(e)) => {
                JsonRpcError::parse_error(format!("Invalid UTF-8: {}", e))
            }
            Err(TransportError::InvalidRequest(e)) => {
                JsonRpcError::invalid_request(format!("Invalid request: {}", e))
            }
            Err(e) => return Err(e),
        };

        warn!(error = %error.message, "Rejected malformed message");
        transport
            .send(JsonRpcResponse::error(JsonRpcId::Null, error))
            .await?;
    }
}
