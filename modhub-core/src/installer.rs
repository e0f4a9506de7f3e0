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

//! Module installer
//!
//! Installation is split into a plan step, which performs every precondition
//! check without touching the filesystem, and an execute step, which copies
//! the module's `src/` tree into `<target_dir>/<slug>/`.
//!
//! The copy is not transactional: a failure partway leaves the files already
//! copied in place. Re-installing overwrites file by file.

use crate::error::{HubError, HubResult};
use crate::manifest::{ManifestLoader, ModuleManifest};
use crate::registry::{ModuleEntry, RegistryStore};
use filetime::FileTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Import-safe directory name for a module (`fastapi-jwt-auth` → `fastapi_jwt_auth`)
pub fn slug(name: &str) -> String {
    name.replace('-', "_")
}

/// Absolute, lexically normalized form of `target_dir`.
///
/// Relative paths resolve against the process working directory. The path
/// does not need to exist.
pub fn resolve_target(target_dir: &Path) -> HubResult<PathBuf> {
    let absolute = std::path::absolute(target_dir).map_err(|e| HubError::io(target_dir, e))?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Everything needed to perform an install, validated up front
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub entry: ModuleEntry,
    pub manifest: ModuleManifest,
    pub source_dir: PathBuf,
    pub destination: PathBuf,
}

/// Outcome of a successful install
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallReport {
    pub module: String,
    pub destination: PathBuf,
    /// Copied files relative to the destination, `/`-separated
    pub copied: Vec<String>,
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

impl InstallReport {
    /// Caller-facing summary with installation guidance
    pub fn to_message(&self) -> String {
        let mut parts = vec![
            format!(
                "Module '{}' installed to {}",
                self.module,
                self.destination.display()
            ),
            format!("Copied files: {}", self.copied.join(", ")),
        ];
        if !self.dependencies.is_empty() {
            parts.push(format!(
                "Dependencies to install: {}",
                self.dependencies.join(", ")
            ));
        }
        if let Some(entry) = &self.entry {
            parts.push(format!("Import: {}", entry));
        }
        parts.join("\n")
    }
}

/// Check install preconditions in order:
/// unknown module, blueprint, missing manifest, missing source tree.
///
/// No filesystem writes happen here.
pub fn plan_install(
    registry: &RegistryStore,
    manifests: &ManifestLoader,
    name: &str,
    target_dir: &Path,
) -> HubResult<InstallPlan> {
    let entry = registry
        .find_by_name(name)?
        .ok_or_else(|| HubError::ModuleNotFound(name.to_string()))?;

    if !entry.kind.is_installable() {
        return Err(HubError::BlueprintNotInstallable(entry.name));
    }

    let manifest = manifests.require(&entry)?;

    let source_dir = manifests.source_dir(&entry);
    if !source_dir.is_dir() {
        return Err(HubError::SourceMissing(source_dir));
    }

    let destination = resolve_target(target_dir)?.join(slug(&entry.name));

    Ok(InstallPlan {
        entry,
        manifest,
        source_dir,
        destination,
    })
}

/// Copy the planned module into its destination.
pub fn execute_install(plan: &InstallPlan) -> HubResult<InstallReport> {
    fs::create_dir_all(&plan.destination).map_err(|e| HubError::io(&plan.destination, e))?;

    let copied = copy_tree(&plan.source_dir, &plan.destination)?;

    info!(
        module = %plan.entry.name,
        destination = %plan.destination.display(),
        files = copied.len(),
        "Installed module"
    );

    Ok(InstallReport {
        module: plan.entry.name.clone(),
        destination: plan.destination.clone(),
        copied,
        dependencies: plan.manifest.dependencies().to_vec(),
        entry: plan.manifest.entry_point().map(str::to_string),
    })
}

/// Recursively copy every file under `src` into `dst`, overwriting.
///
/// Files are visited in file-name order. Access and modification times are
/// carried over. On failure the error lists the files copied so far.
pub fn copy_tree(src: &Path, dst: &Path) -> HubResult<Vec<String>> {
    let mut copied = Vec::new();

    for entry in WalkDir::new(src)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                return Err(HubError::CopyFailed {
                    copied,
                    source: io::Error::from(e),
                })
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        // WalkDir yields children of `src`, so the prefix is always present
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };

        if let Err(source) = copy_file(entry.path(), &dst.join(&rel)) {
            return Err(HubError::CopyFailed { copied, source });
        }

        let rel_display = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        debug!(file = %rel_display, "Copied file");
        copied.push(rel_display);
    }

    Ok(copied)
}

fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;

    let metadata = fs::metadata(src)?;
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModuleKind;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        registry: RegistryStore,
        manifests: ManifestLoader,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        Fixture {
            registry: RegistryStore::new(root.join("registry.json")),
            manifests: ManifestLoader::new(root.join("modules")),
            root,
            _dir: dir,
        }
    }

    fn add_module(f: &Fixture, name: &str, kind: ModuleKind, with_manifest: bool, files: &[(&str, &str)]) {
        let path = format!("{}/{}", kind, name);
        let entry = ModuleEntry {
            name: name.to_string(),
            kind,
            lang: "python".to_string(),
            summary: "fixture".to_string(),
            tags: vec![],
            path: path.clone(),
        };
        let dir = f.root.join("modules").join(&path);
        fs::create_dir_all(&dir).unwrap();
        if with_manifest {
            fs::write(
                dir.join("manifest.json"),
                json!({
                    "name": name,
                    "type": kind.as_str(),
                    "lang": "python",
                    "summary": "fixture",
                    "install": {"dependencies": ["httpx"], "entry": "from http_client import get"}
                })
                .to_string(),
            )
            .unwrap();
        }
        for (rel, contents) in files {
            let file = dir.join("src").join(rel);
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, contents).unwrap();
        }
        f.registry.upsert(entry).unwrap();
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("fastapi-jwt-auth"), "fastapi_jwt_auth");
        assert_eq!(slug("plain"), "plain");
    }

    #[test]
    fn test_resolve_target_normalizes() {
        let resolved = resolve_target(Path::new("/tmp/a/./b/../c")).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/a/c"));
        assert!(resolve_target(Path::new("lib")).unwrap().is_absolute());
    }

    #[test]
    fn test_install_copies_tree() {
        let f = fixture();
        add_module(
            &f,
            "http-client",
            ModuleKind::Utility,
            true,
            &[("a.py", "print('a')\n"), ("sub/b.py", "print('b')\n")],
        );
        let target = f.root.join("project/lib");

        let plan = plan_install(&f.registry, &f.manifests, "http-client", &target).unwrap();
        let report = execute_install(&plan).unwrap();

        let dest = target.join("http_client");
        assert_eq!(report.destination, dest);
        assert_eq!(report.copied, vec!["a.py", "sub/b.py"]);
        assert_eq!(fs::read_to_string(dest.join("a.py")).unwrap(), "print('a')\n");
        assert_eq!(fs::read_to_string(dest.join("sub/b.py")).unwrap(), "print('b')\n");
        assert_eq!(report.dependencies, vec!["httpx"]);

        let message = report.to_message();
        assert!(message.contains("Copied files: a.py, sub/b.py"));
        assert!(message.contains("Dependencies to install: httpx"));
        assert!(message.contains("Import: from http_client import get"));
    }

    #[test]
    fn test_reinstall_overwrites() {
        let f = fixture();
        add_module(&f, "cfg", ModuleKind::Utility, true, &[("config.py", "v2")]);
        let target = f.root.join("lib");
        let dest = target.join("cfg");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("config.py"), "v1 local edits").unwrap();
        fs::write(dest.join("extra.py"), "kept").unwrap();

        let plan = plan_install(&f.registry, &f.manifests, "cfg", &target).unwrap();
        execute_install(&plan).unwrap();
        execute_install(&plan).unwrap();

        assert_eq!(fs::read_to_string(dest.join("config.py")).unwrap(), "v2");
        assert_eq!(fs::read_to_string(dest.join("extra.py")).unwrap(), "kept");
    }

    #[test]
    fn test_preserves_modification_time() {
        let f = fixture();
        add_module(&f, "timed", ModuleKind::Utility, true, &[("t.py", "x")]);
        let src_file = f.root.join("modules/utility/timed/src/t.py");
        let past = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src_file, past).unwrap();

        let target = f.root.join("lib");
        let plan = plan_install(&f.registry, &f.manifests, "timed", &target).unwrap();
        execute_install(&plan).unwrap();

        let meta = fs::metadata(target.join("timed/t.py")).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), past);
    }

    #[test]
    fn test_precondition_order() {
        let f = fixture();
        let target = f.root.join("lib");

        assert!(matches!(
            plan_install(&f.registry, &f.manifests, "nope", &target),
            Err(HubError::ModuleNotFound(_))
        ));

        // Blueprint is rejected before the manifest is looked at
        add_module(&f, "clean-arch", ModuleKind::Blueprint, false, &[]);
        assert!(matches!(
            plan_install(&f.registry, &f.manifests, "clean-arch", &target),
            Err(HubError::BlueprintNotInstallable(_))
        ));

        add_module(&f, "no-manifest", ModuleKind::Utility, false, &[("a.py", "")]);
        assert!(matches!(
            plan_install(&f.registry, &f.manifests, "no-manifest", &target),
            Err(HubError::ManifestMissing(_))
        ));

        add_module(&f, "no-src", ModuleKind::Component, true, &[]);
        assert!(matches!(
            plan_install(&f.registry, &f.manifests, "no-src", &target),
            Err(HubError::SourceMissing(_))
        ));

        assert!(!target.exists());
    }
}
