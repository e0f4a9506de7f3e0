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

//! Catalog tools: `search_modules`, `get_module_api` and `install_module`.
//!
//! Each tool deserializes its validated arguments and runs the matching
//! [`ModuleHub`] call on the blocking pool. Domain failures arrive as plain
//! text from the hub; anything still an error (malformed catalog files,
//! unexpected I/O) becomes [`ToolError::Execution`].

use super::registry::{McpTool, ToolError};
use async_trait::async_trait;
use modhub_core::{HubResult, ModuleHub};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

pub const SEARCH_MODULES: &str = "search_modules";
pub const GET_MODULE_API: &str = "get_module_api";
pub const INSTALL_MODULE: &str = "install_module";

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidParams(e.to_string()))
}

async fn run_blocking<F>(tool: &'static str, f: F) -> Result<String, ToolError>
where
    F: FnOnce() -> HubResult<String> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ToolError::Execution(format!("{} task failed: {}", tool, e)))?
        .map_err(|e| {
            error!(tool, error = %e, "Tool failed");
            ToolError::Execution(e.to_string())
        })
}

// =============================================================================
// search_modules
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

pub struct SearchModulesTool {
    hub: Arc<ModuleHub>,
    schema: Value,
}

impl SearchModulesTool {
    pub fn new(hub: Arc<ModuleHub>) -> Self {
        Self {
            hub,
            schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Keywords matched against tags, names and summaries. Empty lists every module."
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for SearchModulesTool {
    fn name(&self) -> &str {
        SEARCH_MODULES
    }

    fn description(&self) -> &str {
        "Search the module catalog by keywords. Returns name, type, language and summary of each match, best match first."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, arguments: Value) -> Result<String, ToolError> {
        let args: SearchArgs = parse_args(arguments)?;
        let hub = Arc::clone(&self.hub);
        run_blocking(SEARCH_MODULES, move || hub.search_text(&args.query)).await
    }
}

// =============================================================================
// get_module_api
// =============================================================================

#[derive(Debug, Deserialize)]
struct DescribeArgs {
    name: String,
}

pub struct GetModuleApiTool {
    hub: Arc<ModuleHub>,
    schema: Value,
}

impl GetModuleApiTool {
    pub fn new(hub: Arc<ModuleHub>) -> Self {
        Self {
            hub,
            schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Exact module name as returned by search_modules"
                    }
                },
                "required": ["name"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for GetModuleApiTool {
    fn name(&self) -> &str {
        GET_MODULE_API
    }

    fn description(&self) -> &str {
        "Show a module's API document: summary, installation notes, API surface, adaptation points and design decisions. Never includes source code."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, arguments: Value) -> Result<String, ToolError> {
        let args: DescribeArgs = parse_args(arguments)?;
        let hub = Arc::clone(&self.hub);
        run_blocking(GET_MODULE_API, move || hub.describe_text(&args.name)).await
    }
}

// =============================================================================
// install_module
// =============================================================================

#[derive(Debug, Deserialize)]
struct InstallArgs {
    name: String,
    target_dir: String,
}

pub struct InstallModuleTool {
    hub: Arc<ModuleHub>,
    schema: Value,
}

impl InstallModuleTool {
    pub fn new(hub: Arc<ModuleHub>) -> Self {
        Self {
            hub,
            schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Exact module name as returned by search_modules"
                    },
                    "target_dir": {
                        "type": "string",
                        "description": "Directory that receives a folder named after the module"
                    }
                },
                "required": ["name", "target_dir"]
            }),
        }
    }
}

#[async_trait]
impl McpTool for InstallModuleTool {
    fn name(&self) -> &str {
        INSTALL_MODULE
    }

    fn description(&self) -> &str {
        "Copy a utility or component module's source files into target_dir and report dependencies and the import line. Blueprints cannot be installed."
    }

    fn input_schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, arguments: Value) -> Result<String, ToolError> {
        let args: InstallArgs = parse_args(arguments)?;
        let hub = Arc::clone(&self.hub);
        run_blocking(INSTALL_MODULE, move || {
            hub.install_text(&args.name, &args.target_dir)
        })
        .await
    }
}
