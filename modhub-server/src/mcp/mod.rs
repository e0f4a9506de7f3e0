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

//! Model Context Protocol (MCP) server
//!
//! Exposes the catalog to coding assistants through three tools:
//!
//! - `search_modules`: keyword search over the registry
//! - `get_module_api`: API document for one module
//! - `install_module`: copy a module's sources into a project
//!
//! ## Transports
//!
//! - stdio, newline-delimited JSON-RPC (`modhub-server stdio`)
//! - `POST /mcp` for single request/response exchanges
//! - `GET /sse` + `POST /messages` for SSE clients

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use handlers::McpHandler;
pub use protocol::*;
pub use server::{McpServer, McpServerState};
pub use tools::{McpTool, ToolError, ToolRegistry};
pub use transport::{
    serve_transport, BufferTransport, LineTransport, McpTransport, StdioTransport, TransportError,
};
