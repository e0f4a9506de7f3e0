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

//! Module registry store
//!
//! The registry is the searchable index of the catalog: one entry per module,
//! unique by name, persisted as a single JSON document. It is re-read on every
//! call; nothing is cached between requests.

use crate::error::HubResult;
use crate::persist::{read_document, write_document};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Registry document format version
pub const REGISTRY_VERSION: &str = "1.0";

/// Kind of a cataloged module
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Small standalone helper
    Utility,
    /// Reusable building block with adaptation points
    Component,
    /// Architectural guidance, not copyable source
    Blueprint,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Utility => "utility",
            ModuleKind::Component => "component",
            ModuleKind::Blueprint => "blueprint",
        }
    }

    /// Blueprints carry no installable source tree.
    pub fn is_installable(&self) -> bool {
        !matches!(self, ModuleKind::Blueprint)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One registry entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub lang: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Module directory, relative to the modules root
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    modules: Vec<ModuleEntry>,
}

fn default_version() -> String {
    REGISTRY_VERSION.to_string()
}

/// File-backed registry store
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries in registry order.
    ///
    /// An absent file is an empty registry. A malformed file is an error.
    pub fn load(&self) -> HubResult<Vec<ModuleEntry>> {
        match read_document::<RegistryDocument>(&self.path)? {
            Some(doc) => {
                debug!(path = %self.path.display(), modules = doc.modules.len(), "Loaded registry");
                Ok(doc.modules)
            }
            None => {
                debug!(path = %self.path.display(), "Registry file not found, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Persist the full entry list, replacing prior contents.
    pub fn save(&self, entries: &[ModuleEntry]) -> HubResult<()> {
        let doc = RegistryDocument {
            version: default_version(),
            modules: entries.to_vec(),
        };
        write_document(&self.path, &doc)
    }

    /// First entry whose name matches exactly (case-sensitive).
    pub fn find_by_name(&self, name: &str) -> HubResult<Option<ModuleEntry>> {
        Ok(self.load()?.into_iter().find(|entry| entry.name == name))
    }

    /// Register an entry, replacing any entry with the same name.
    ///
    /// Other entries keep their relative order; the new entry is appended.
    /// Returns true when an existing entry was replaced.
    pub fn upsert(&self, entry: ModuleEntry) -> HubResult<bool> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|existing| existing.name != entry.name);
        let replaced = entries.len() != before;

        info!(
            name = %entry.name,
            kind = %entry.kind,
            replaced,
            "Registering module"
        );

        entries.push(entry);
        self.save(&entries)?;
        Ok(replaced)
    }
}
