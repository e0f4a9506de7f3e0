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

//! Module manifest parsing
//!
//! Each module directory carries a `manifest.json` with the detail record
//! consulted by `get_module_api` and `install_module`. The registry only
//! indexes a projection of it.

use crate::error::{HubError, HubResult};
use crate::persist::read_document;
use crate::registry::{ModuleEntry, ModuleKind};
use crate::{MANIFEST_FILENAME, SOURCE_DIR_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-module manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleManifest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub lang: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallSpec>,
    /// Free-form API description, rendered as JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<serde_json::Value>,
    /// Places a component is expected to be adapted (component convention)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adapt_points: Vec<String>,
    /// Rationale behind a blueprint (blueprint convention)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub design_decisions: Vec<String>,
}

/// Installation guidance; descriptive only, never executed
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallSpec {
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

impl InstallSpec {
    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref().filter(|e| !e.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.entry().is_none()
    }
}

impl ModuleManifest {
    /// Parse the manifest in `dir`; `Ok(None)` when the file is absent.
    pub fn from_directory(dir: &Path) -> HubResult<Option<Self>> {
        read_document(&dir.join(MANIFEST_FILENAME))
    }

    /// Declared dependency strings (empty when no install section)
    pub fn dependencies(&self) -> &[String] {
        self.install
            .as_ref()
            .map(|i| i.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Import/usage string, if declared
    pub fn entry_point(&self) -> Option<&str> {
        self.install.as_ref().and_then(|i| i.entry())
    }

    /// API section with empty values treated as absent
    pub fn api(&self) -> Option<&serde_json::Value> {
        self.api.as_ref().filter(|value| match value {
            serde_json::Value::Null => false,
            serde_json::Value::Object(map) => !map.is_empty(),
            serde_json::Value::Array(items) => !items.is_empty(),
            serde_json::Value::String(s) => !s.is_empty(),
            _ => true,
        })
    }

    /// Registry projection of this manifest for a module stored at `path`.
    pub fn to_entry(&self, path: impl Into<String>) -> ModuleEntry {
        ModuleEntry {
            name: self.name.clone(),
            kind: self.kind,
            lang: self.lang.clone(),
            summary: self.summary.clone(),
            tags: self.tags.iter().map(|t| t.to_lowercase()).collect(),
            path: path.into(),
        }
    }
}

/// Resolves registry entries to their manifest and source tree
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    modules_root: PathBuf,
}

impl ManifestLoader {
    pub fn new(modules_root: impl AsRef<Path>) -> Self {
        Self {
            modules_root: modules_root.as_ref().to_path_buf(),
        }
    }

    pub fn modules_root(&self) -> &Path {
        &self.modules_root
    }

    pub fn module_dir(&self, entry: &ModuleEntry) -> PathBuf {
        self.modules_root.join(&entry.path)
    }

    pub fn manifest_path(&self, entry: &ModuleEntry) -> PathBuf {
        self.module_dir(entry).join(MANIFEST_FILENAME)
    }

    pub fn source_dir(&self, entry: &ModuleEntry) -> PathBuf {
        self.module_dir(entry).join(SOURCE_DIR_NAME)
    }

    /// Load the manifest for `entry`; `Ok(None)` when the file does not exist.
    pub fn load(&self, entry: &ModuleEntry) -> HubResult<Option<ModuleManifest>> {
        ModuleManifest::from_directory(&self.module_dir(entry))
    }

    /// Like [`load`](Self::load) but a missing manifest is `ManifestMissing`.
    pub fn require(&self, entry: &ModuleEntry) -> HubResult<ModuleManifest> {
        self.load(entry)?
            .ok_or_else(|| HubError::ManifestMissing(entry.name.clone()))
    }
}
