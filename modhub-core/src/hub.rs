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

//! Catalog facade
//!
//! [`ModuleHub`] is the single entry point shared by the stdio and HTTP
//! front-ends and the admin CLI. Every call re-reads the files it needs.
//!
//! The `*_text` methods are the tool boundary: domain failures (unknown
//! module, missing manifest, blueprint install, partial copy) come back as
//! `Ok(message)`. Only malformed persisted state and unexpected I/O errors
//! remain `Err`.

use crate::config::CatalogConfig;
use crate::error::{HubError, HubResult};
use crate::installer::{execute_install, plan_install, InstallReport};
use crate::manifest::{ManifestLoader, ModuleManifest};
use crate::registry::{ModuleEntry, RegistryStore};
use crate::render::render_api_doc;
use crate::search::{search, SearchHit};
use crate::stats::{StatsStore, StatsSummary};
use std::path::{Component, Path};
use tracing::{info, warn};

/// Returned by `search_modules` when nothing matches
pub const NO_RESULTS_MESSAGE: &str = "No matching modules found";

#[derive(Debug, Clone)]
pub struct ModuleHub {
    registry: RegistryStore,
    manifests: ManifestLoader,
    stats: StatsStore,
}

impl ModuleHub {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            registry: RegistryStore::new(&config.registry_path),
            manifests: ManifestLoader::new(&config.modules_root),
            stats: StatsStore::new(&config.stats_path),
        }
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    pub fn manifests(&self) -> &ManifestLoader {
        &self.manifests
    }

    pub fn stats_store(&self) -> &StatsStore {
        &self.stats
    }

    pub fn list(&self) -> HubResult<Vec<ModuleEntry>> {
        self.registry.load()
    }

    pub fn search(&self, query: &str) -> HubResult<Vec<SearchHit>> {
        Ok(search(&self.registry.load()?, query))
    }

    /// API document for `name`, never including source code.
    pub fn describe(&self, name: &str) -> HubResult<String> {
        let entry = self
            .registry
            .find_by_name(name)?
            .ok_or_else(|| HubError::ModuleNotFound(name.to_string()))?;
        let manifest = self.manifests.require(&entry)?;
        Ok(render_api_doc(&manifest))
    }

    /// Install `name` under `target_dir` and record the install.
    ///
    /// The statistics event is written only after the copy succeeded.
    pub fn install(&self, name: &str, target_dir: &str) -> HubResult<InstallReport> {
        let plan = plan_install(&self.registry, &self.manifests, name, Path::new(target_dir))?;
        let report = execute_install(&plan)?;
        self.stats.record(&report.module, target_dir)?;
        Ok(report)
    }

    /// Registry snapshot joined with install counts
    pub fn stats(&self) -> HubResult<StatsSummary> {
        let entries = self.registry.load()?;
        self.stats.aggregate(&entries)
    }

    /// Register the module stored in `module_dir`.
    ///
    /// `module_dir` is either relative to the modules root or a path on disk
    /// inside it. The registry records the path relative to the root.
    pub fn register(&self, module_dir: &Path) -> HubResult<ModuleEntry> {
        let rel = self.relative_module_path(module_dir)?;
        let dir = self.manifests.modules_root().join(&rel);

        let manifest = ModuleManifest::from_directory(&dir)?.ok_or_else(|| {
            HubError::Registration(format!("{} has no manifest.json", dir.display()))
        })?;

        let entry = manifest.to_entry(rel);
        let replaced = self.registry.upsert(entry.clone())?;
        info!(
            name = %entry.name,
            path = %entry.path,
            replaced,
            "Registered module"
        );
        Ok(entry)
    }

    fn relative_module_path(&self, module_dir: &Path) -> HubResult<String> {
        let root = self.manifests.modules_root();

        let under_root = root.join(module_dir);
        let escapes = module_dir
            .components()
            .any(|c| matches!(c, Component::ParentDir));

        let rel = if module_dir.is_relative() && under_root.is_dir() && !escapes {
            module_dir.to_path_buf()
        } else {
            // `..` segments are resolved before the containment check
            let on_disk = if module_dir.is_relative() && under_root.is_dir() {
                under_root.as_path()
            } else {
                module_dir
            };
            let canonical_root = root
                .canonicalize()
                .map_err(|e| HubError::io(root, e))?;
            let canonical_dir = on_disk
                .canonicalize()
                .map_err(|e| HubError::io(module_dir, e))?;
            canonical_dir
                .strip_prefix(&canonical_root)
                .map(Path::to_path_buf)
                .map_err(|_| {
                    HubError::Registration(format!(
                        "{} is not inside the modules root {}",
                        module_dir.display(),
                        root.display()
                    ))
                })?
        };

        let parts: Vec<String> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            return Err(HubError::Registration(
                "module directory cannot be the modules root".to_string(),
            ));
        }
        Ok(parts.join("/"))
    }

    // ------------------------------------------------------------------
    // Tool boundary
    // ------------------------------------------------------------------

    /// `search_modules`: pretty JSON list, or [`NO_RESULTS_MESSAGE`].
    pub fn search_text(&self, query: &str) -> HubResult<String> {
        let hits = self.search(query)?;
        if hits.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }
        Ok(serde_json::to_string_pretty(&hits)?)
    }

    /// `get_module_api`: rendered document or a readable failure.
    pub fn describe_text(&self, name: &str) -> HubResult<String> {
        domain_text(self.describe(name))
    }

    /// `install_module`: install report or a readable failure.
    pub fn install_text(&self, name: &str, target_dir: &str) -> HubResult<String> {
        domain_text(self.install(name, target_dir).map(|report| report.to_message()))
    }
}

fn domain_text(result: HubResult<String>) -> HubResult<String> {
    match result {
        Ok(text) => Ok(text),
        Err(err) if err.is_domain() => {
            warn!(error = %err, "Request failed");
            Ok(domain_message(&err))
        }
        Err(err) => Err(err),
    }
}

/// Caller-facing text for a domain failure
pub fn domain_message(err: &HubError) -> String {
    match err {
        HubError::CopyFailed { copied, source } if !copied.is_empty() => format!(
            "Install failed partway: {}\nFiles already copied: {}",
            source,
            copied.join(", ")
        ),
        HubError::CopyFailed { source, .. } => format!("Install failed: {}", source),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn hub_with_module() -> (TempDir, ModuleHub) {
        let temp_dir = TempDir::new().unwrap();
        let config = CatalogConfig::rooted_at(temp_dir.path());
        let module_dir = config.modules_root.join("utilities/python/http-client");
        fs::create_dir_all(module_dir.join("src")).unwrap();
        fs::write(
            module_dir.join("manifest.json"),
            json!({
                "name": "http-client",
                "type": "utility",
                "lang": "python",
                "summary": "simple http client",
                "tags": ["http", "network"]
            })
            .to_string(),
        )
        .unwrap();
        fs::write(module_dir.join("src/client.py"), "SECRET_SOURCE = 1\n").unwrap();

        let hub = ModuleHub::new(&config);
        hub.register(Path::new("utilities/python/http-client")).unwrap();
        (temp_dir, hub)
    }

    #[test]
    fn test_register_relative_and_absolute() {
        let (temp_dir, hub) = hub_with_module();
        let entries = hub.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "utilities/python/http-client");

        let absolute = temp_dir.path().join("modules/utilities/python/http-client");
        hub.register(&absolute).unwrap();
        let entries = hub.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "utilities/python/http-client");
    }

    #[test]
    fn test_register_outside_root_rejected() {
        let (temp_dir, hub) = hub_with_module();
        let outside = temp_dir.path().join("elsewhere");
        fs::create_dir_all(&outside).unwrap();
        assert!(matches!(
            hub.register(&outside),
            Err(HubError::Registration(_))
        ));
    }

    #[test]
    fn test_register_parent_segments_rejected() {
        let (temp_dir, hub) = hub_with_module();
        fs::create_dir_all(temp_dir.path().join("modules/../outside")).unwrap();

        let err = hub.register(Path::new("../outside")).unwrap_err();
        assert!(err.to_string().contains("is not inside the modules root"));

        // `..` that stays inside the root resolves normally
        let entry = hub
            .register(Path::new("utilities/python/../python/http-client"))
            .unwrap();
        assert_eq!(entry.path, "utilities/python/http-client");
        assert_eq!(hub.list().unwrap().len(), 1);
    }

    #[test]
    fn test_search_text() {
        let (_temp_dir, hub) = hub_with_module();
        let text = hub.search_text("http").unwrap();
        let parsed: Vec<SearchHit> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0].name, "http-client");

        assert_eq!(hub.search_text("kubernetes").unwrap(), NO_RESULTS_MESSAGE);
    }

    #[test]
    fn test_describe_text_excludes_source() {
        let (_temp_dir, hub) = hub_with_module();
        let doc = hub.describe_text("http-client").unwrap();
        assert!(doc.starts_with("# http-client"));
        assert!(!doc.contains("SECRET_SOURCE"));

        assert_eq!(
            hub.describe_text("nonexistent").unwrap(),
            "Module 'nonexistent' does not exist"
        );
    }

    #[test]
    fn test_malformed_registry_propagates() {
        let (temp_dir, hub) = hub_with_module();
        fs::write(temp_dir.path().join("registry.json"), "[").unwrap();
        assert!(hub.search_text("http").is_err());
        assert!(hub.describe_text("http-client").is_err());
        assert!(hub.install_text("http-client", "/tmp/x").is_err());
    }

    #[test]
    fn test_copy_failure_message() {
        let err = HubError::CopyFailed {
            copied: vec!["a.py".to_string()],
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = domain_message(&err);
        assert!(message.contains("denied"));
        assert!(message.contains("Files already copied: a.py"));
    }

    #[cfg(unix)]
    #[test]
    fn test_partial_copy_keeps_files_and_skips_stats() {
        let (temp_dir, hub) = hub_with_module();
        let src = temp_dir.path().join("modules/utilities/python/http-client/src");
        std::os::unix::fs::symlink(src.join("missing.py"), src.join("z.py")).unwrap();

        let target = temp_dir.path().join("app");
        let text = hub
            .install_text("http-client", target.to_str().unwrap())
            .unwrap();
        assert!(text.starts_with("Install failed partway"));
        assert!(text.contains("Files already copied: client.py"));
        assert!(target.join("http_client/client.py").is_file());
        assert!(!target.join("http_client/z.py").exists());
        assert!(hub.stats_store().events().unwrap().is_empty());
    }
}
