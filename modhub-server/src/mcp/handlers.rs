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

//! MCP Request Handlers
//!
//! Handles JSON-RPC 2.0 requests for the MCP protocol. Shared by the stdio
//! transport and the HTTP endpoints.

use crate::mcp::protocol::*;
use crate::mcp::tools::{catalog_tools, RegistrationError, ToolError, ToolRegistry};
use modhub_core::ModuleHub;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// MCP request handler
pub struct McpHandler {
    tools: ToolRegistry,
}

impl McpHandler {
    /// Handler serving the catalog tools of `hub`
    pub fn new(hub: Arc<ModuleHub>) -> Result<Self, RegistrationError> {
        Ok(Self::with_tools(catalog_tools(hub)?))
    }

    pub fn with_tools(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    /// Handle one raw JSON-RPC message.
    ///
    /// Unparseable input yields a parse error with a null id; valid JSON
    /// that is not a request object yields an invalid request error.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Invalid JSON-RPC message");
                return Some(JsonRpcResponse::error(
                    JsonRpcId::Null,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                ));
            }
        };
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "Message is not a JSON-RPC request");
                Some(JsonRpcResponse::error(
                    JsonRpcId::Null,
                    JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
                ))
            }
        }
    }

    /// Handle a JSON-RPC request. Notifications return `None`.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };

        debug!(method = %request.method, "MCP request received");

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            ));
        }

        let response = match request.method.as_str() {
            "ping" => JsonRpcResponse::success(id, json!({})),
            "initialize" => self.handle_initialize(id, request.params),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => {
                warn!(method = %request.method, "Unknown MCP method");
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(&request.method))
            }
        };
        Some(response)
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" | "initialized" => info!("MCP client initialized"),
            "notifications/cancelled" => debug!("Cancellation ignored, tool calls run to completion"),
            _ => debug!(method, "Ignoring notification"),
        }
    }

    fn handle_initialize(&self, id: JsonRpcId, params: Option<Value>) -> JsonRpcResponse {
        let init_params: InitializeParams = match parse_params(params, "initialize") {
            Ok(p) => p,
            Err(e) => return JsonRpcResponse::error(id, e),
        };
        info!(
            client = %init_params.client_info.name,
            client_version = %init_params.client_info.version,
            protocol_version = %init_params.protocol_version,
            "MCP initialize"
        );

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    fn handle_tools_list(&self, id: JsonRpcId) -> JsonRpcResponse {
        let result = ListToolsResult {
            tools: self.tools.list(),
            next_cursor: None,
        };

        JsonRpcResponse::from_result(id, &result)
    }

    async fn handle_tools_call(&self, id: JsonRpcId, params: Option<Value>) -> JsonRpcResponse {
        let call_params: CallToolParams = match parse_params(params, "tool call") {
            Ok(p) => p,
            Err(e) => return JsonRpcResponse::error(id, e),
        };

        info!(tool = %call_params.name, "Executing MCP tool");

        let result = match self
            .tools
            .execute(&call_params.name, Value::Object(call_params.arguments))
            .await
        {
            Ok(text) => CallToolResult::text(text),
            Err(ToolError::InvalidParams(message)) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params(message))
            }
            Err(e @ ToolError::NotFound(_)) => {
                warn!(tool = %call_params.name, "Unknown tool");
                CallToolResult::text(e.to_string())
            }
            Err(ToolError::Execution(message)) => CallToolResult::error(message),
        };

        JsonRpcResponse::from_result(id, &result)
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>, what: &str) -> Result<T, JsonRpcError> {
    match params {
        Some(p) => serde_json::from_value(p)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid {} params: {}", what, e))),
        None => Err(JsonRpcError::invalid_params(format!(
            "Missing {} params",
            what
        ))),
    }
}
