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

use anyhow::Result;
use clap::{Parser, Subcommand};
use modhub_server::{config::ServerConfig, init_tracing, run_server, run_stdio};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// HTTP listen address (overrides config file)
    #[arg(long, global = true, env = "MODHUB_HTTP_ADDR")]
    http_addr: Option<String>,

    /// Registry file (overrides config file)
    #[arg(long, global = true, env = "MODHUB_REGISTRY")]
    registry: Option<PathBuf>,

    /// Modules directory (overrides config file)
    #[arg(long, global = true, env = "MODHUB_MODULES_ROOT")]
    modules_root: Option<PathBuf>,

    /// Install statistics file (overrides config file)
    #[arg(long, global = true, env = "MODHUB_STATS")]
    stats: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Serve the dashboard and MCP over HTTP (default)
    Serve,
    /// Serve MCP over stdin/stdout
    Stdio,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Serve);

    init_tracing(args.log_json, command == Command::Stdio)?;

    // Load configuration
    let mut config = ServerConfig::load(args.config)?;

    // Apply CLI overrides
    if let Some(addr) = args.http_addr {
        config.server.listen_addr = addr;
    }
    if let Some(registry) = args.registry {
        config.catalog.registry_path = registry;
    }
    if let Some(modules_root) = args.modules_root {
        config.catalog.modules_root = modules_root;
    }
    if let Some(stats) = args.stats {
        config.catalog.stats_path = stats;
    }

    match command {
        Command::Serve => run_server(config).await,
        Command::Stdio => run_stdio(config).await,
    }
}
