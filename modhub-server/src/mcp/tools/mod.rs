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

//! MCP tools exposed by the catalog server.

pub mod catalog;
pub mod registry;

pub use catalog::{
    GetModuleApiTool, InstallModuleTool, SearchModulesTool, GET_MODULE_API, INSTALL_MODULE,
    SEARCH_MODULES,
};
pub use registry::{McpTool, RegistrationError, ToolError, ToolRegistry};

use modhub_core::ModuleHub;
use std::sync::Arc;

/// Registry holding the three catalog tools
pub fn catalog_tools(hub: Arc<ModuleHub>) -> Result<ToolRegistry, RegistrationError> {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(SearchModulesTool::new(Arc::clone(&hub))))?;
    registry.register(Arc::new(GetModuleApiTool::new(Arc::clone(&hub))))?;
    registry.register(Arc::new(InstallModuleTool::new(hub)))?;
    Ok(registry)
}
