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

//! Modhub core
//!
//! Registry-and-retrieval engine for a curated catalog of reusable code
//! modules. An agent can search the catalog, read a module's API document,
//! and install a module's source tree into its project.
//!
//! # Layout on disk
//!
//! ```text
//! catalog/
//! ├── registry.json          {"version": "1.0", "modules": [...]}
//! ├── install_stats.json     {"installs": [...]}
//! └── modules/
//!     └── components/python/fastapi-jwt-auth/
//!         ├── manifest.json
//!         └── src/...
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use modhub_core::{CatalogConfig, ModuleHub};
//!
//! let hub = ModuleHub::new(&CatalogConfig::rooted_at("./catalog"));
//! for hit in hub.search("jwt auth")? {
//!     println!("{} ({})", hit.name, hit.kind);
//! }
//! let report = hub.install("fastapi-jwt-auth", "./app/lib")?;
//! println!("{}", report.to_message());
//! ```

pub mod config;
pub mod error;
pub mod hub;
pub mod installer;
pub mod manifest;
mod persist;
pub mod registry;
pub mod render;
pub mod search;
pub mod stats;

pub use config::CatalogConfig;
pub use error::{HubError, HubResult};
pub use hub::{domain_message, ModuleHub, NO_RESULTS_MESSAGE};
pub use installer::{
    copy_tree, execute_install, plan_install, resolve_target, slug, InstallPlan, InstallReport,
};
pub use manifest::{InstallSpec, ManifestLoader, ModuleManifest};
pub use registry::{ModuleEntry, ModuleKind, RegistryStore, REGISTRY_VERSION};
pub use render::render_api_doc;
pub use search::{SearchHit, NAME_WEIGHT, SUMMARY_WEIGHT, TAG_WEIGHT};
pub use stats::{InstallEvent, ModuleStats, StatsStore, StatsSummary};

/// Manifest filename inside each module directory
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Installable source subtree inside each module directory
pub const SOURCE_DIR_NAME: &str = "src";
