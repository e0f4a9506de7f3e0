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

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the catalog's persisted state
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Registry index file (`{"version": "1.0", "modules": [...]}`)
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    /// Directory that registry entry paths are relative to
    #[serde(default = "default_modules_root")]
    pub modules_root: PathBuf,

    /// Install statistics log
    #[serde(default = "default_stats_path")]
    pub stats_path: PathBuf,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("./catalog/registry.json")
}

fn default_modules_root() -> PathBuf {
    PathBuf::from("./catalog/modules")
}

fn default_stats_path() -> PathBuf {
    PathBuf::from("./catalog/install_stats.json")
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            modules_root: default_modules_root(),
            stats_path: default_stats_path(),
        }
    }
}

impl CatalogConfig {
    /// Catalog rooted at a single directory, using the default file names.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            registry_path: root.join("registry.json"),
            modules_root: root.join("modules"),
            stats_path: root.join("install_stats.json"),
        }
    }

    /// Apply MODHUB_* environment overrides.
    ///
    /// - MODHUB_REGISTRY: registry file
    /// - MODHUB_MODULES_ROOT: modules directory
    /// - MODHUB_STATS: statistics file
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("MODHUB_REGISTRY") {
            self.registry_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("MODHUB_MODULES_ROOT") {
            self.modules_root = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("MODHUB_STATS") {
            self.stats_path = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (field, path) in [
            ("registry_path", &self.registry_path),
            ("modules_root", &self.modules_root),
            ("stats_path", &self.stats_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(format!("catalog.{} cannot be empty", field));
            }
        }
        Ok(())
    }
}
