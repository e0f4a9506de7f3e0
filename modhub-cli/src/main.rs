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

//! Modhub CLI
//!
//! Offline administration of the module catalog: register modules, inspect
//! the registry and run the same search/describe/install operations the MCP
//! tools expose.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modhub_core::{domain_message, CatalogConfig, HubError, ModuleHub, NO_RESULTS_MESSAGE};
use std::path::PathBuf;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "modhub")]
#[command(about = "Modhub - module catalog administration", long_about = None)]
struct Cli {
    /// Registry file
    #[arg(long, global = true, env = "MODHUB_REGISTRY")]
    registry: Option<PathBuf>,

    /// Modules directory
    #[arg(long, global = true, env = "MODHUB_MODULES_ROOT")]
    modules_root: Option<PathBuf>,

    /// Install statistics file
    #[arg(long, global = true, env = "MODHUB_STATS")]
    stats: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register (or re-register) the module in a directory
    Register {
        /// Module directory, relative to the modules root or inside it
        module_dir: PathBuf,
    },

    /// List registered modules
    List,

    /// Search modules by keywords
    Search {
        /// Keywords; none lists everything
        query: Vec<String>,
    },

    /// Show a module's API document
    Show {
        /// Module name
        name: String,
    },

    /// Install a module's sources into a directory
    Install {
        /// Module name
        name: String,

        /// Directory that receives the module folder
        target_dir: String,
    },

    /// Show install statistics
    Stats,
}

impl Cli {
    fn catalog_config(&self) -> CatalogConfig {
        let mut config = CatalogConfig::default();
        if let Some(path) = &self.registry {
            config.registry_path = path.clone();
        }
        if let Some(path) = &self.modules_root {
            config.modules_root = path.clone();
        }
        if let Some(path) = &self.stats {
            config.stats_path = path.clone();
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.catalog_config();
    config.validate().map_err(anyhow::Error::msg)?;
    debug!(?config, "Catalog configuration");
    let hub = ModuleHub::new(&config);

    match cli.command {
        Commands::Register { module_dir } => {
            let entry = hub
                .register(&module_dir)
                .with_context(|| format!("Failed to register {}", module_dir.display()))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("✓ Registered {} ({}, {})", entry.name, entry.kind, entry.lang);
                println!("  Path: {}", entry.path);
                println!("  Registry: {}", hub.registry().path().display());
            }
        }

        Commands::List => {
            let entries = hub.list().context("Failed to read registry")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No modules registered.");
                println!("\nRegistry: {}", hub.registry().path().display());
            } else {
                println!("Registered Modules ({}):", entries.len());
                println!("{:-<60}", "");
                for entry in &entries {
                    println!("{} [{}] {}", entry.name, entry.kind, entry.lang);
                    println!("    {}", entry.summary);
                    if !entry.tags.is_empty() {
                        println!("    Tags: {}", entry.tags.join(", "));
                    }
                    println!("    Path: {}", entry.path);
                }
            }
        }

        Commands::Search { query } => {
            let query = query.join(" ");
            let hits = hub.search(&query).context("Search failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else if hits.is_empty() {
                println!("{}", NO_RESULTS_MESSAGE);
            } else {
                for hit in &hits {
                    println!("{:<32} {:<10} {:<12} {}", hit.name, hit.kind, hit.lang, hit.summary);
                }
            }
        }

        Commands::Show { name } => {
            println!("{}", or_domain_message(hub.describe(&name))?);
        }

        Commands::Install { name, target_dir } => match hub.install(&name, &target_dir) {
            Ok(report) if cli.json => println!("{}", serde_json::to_string_pretty(&report)?),
            Ok(report) => println!("✓ {}", report.to_message()),
            Err(e) if e.is_domain() => anyhow::bail!(domain_message(&e)),
            Err(e) => return Err(e).context("Install failed"),
        },

        Commands::Stats => {
            let summary = hub.stats().context("Failed to read install statistics")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Modhub Statistics");
                println!("=================");
                println!("Modules:  {}", summary.total_modules);
                println!("Installs: {}", summary.total_installs);
                println!();
                let mut rows = summary.modules.clone();
                rows.sort_by(|a, b| b.installs.cmp(&a.installs));
                for row in &rows {
                    println!("{:>6}  {} [{}]", row.installs, row.name, row.kind);
                }
            }
        }
    }

    Ok(())
}

/// Domain failures become a plain error message; anything else keeps its chain.
fn or_domain_message(result: Result<String, HubError>) -> Result<String> {
    match result {
        Ok(text) => Ok(text),
        Err(e) if e.is_domain() => anyhow::bail!(domain_message(&e)),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_overrides() {
        let cli = Cli::try_parse_from([
            "modhub",
            "--modules-root",
            "/srv/modules",
            "search",
            "jwt",
            "auth",
        ])
        .unwrap();
        let config = cli.catalog_config();
        assert_eq!(config.modules_root, PathBuf::from("/srv/modules"));
        assert!(matches!(cli.command, Commands::Search { ref query } if query == &["jwt", "auth"]));
    }

    #[test]
    fn test_install_requires_target() {
        assert!(Cli::try_parse_from(["modhub", "install", "slugify"]).is_err());
    }
}
