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

//! Install statistics
//!
//! An append-only log of install events, persisted as one JSON document and
//! rewritten in full on each append. Concurrent writers are not coordinated.

use crate::error::HubResult;
use crate::persist::{read_document, write_document};
use crate::registry::{ModuleEntry, ModuleKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// One recorded install
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallEvent {
    pub module: String,
    pub target_dir: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StatsDocument {
    #[serde(default)]
    installs: Vec<InstallEvent>,
}

/// Per-module row of the dashboard view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleStats {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub lang: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub installs: u64,
}

/// Dashboard aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSummary {
    pub total_modules: usize,
    pub total_installs: usize,
    pub modules: Vec<ModuleStats>,
}

/// File-backed install log
#[derive(Debug, Clone)]
pub struct StatsStore {
    path: PathBuf,
}

impl StatsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All events in log order; absent file is an empty log.
    pub fn events(&self) -> HubResult<Vec<InstallEvent>> {
        Ok(read_document::<StatsDocument>(&self.path)?
            .unwrap_or_default()
            .installs)
    }

    /// Append an install event stamped with the current UTC time.
    pub fn record(&self, module: &str, target_dir: &str) -> HubResult<InstallEvent> {
        let mut doc = read_document::<StatsDocument>(&self.path)?.unwrap_or_default();

        let event = InstallEvent {
            module: module.to_string(),
            target_dir: target_dir.to_string(),
            timestamp: Utc::now(),
        };
        doc.installs.push(event.clone());
        write_document(&self.path, &doc)?;

        info!(module, target_dir, total = doc.installs.len(), "Recorded install");
        Ok(event)
    }

    /// Join registry entries with their install counts.
    pub fn aggregate(&self, entries: &[ModuleEntry]) -> HubResult<StatsSummary> {
        let events = self.events()?;

        let mut counts: HashMap<&str, u64> = HashMap::new();
        for event in &events {
            *counts.entry(event.module.as_str()).or_default() += 1;
        }

        let modules = entries
            .iter()
            .map(|entry| ModuleStats {
                name: entry.name.clone(),
                kind: entry.kind,
                lang: entry.lang.clone(),
                summary: entry.summary.clone(),
                tags: entry.tags.clone(),
                installs: counts.get(entry.name.as_str()).copied().unwrap_or(0),
            })
            .collect();

        Ok(StatsSummary {
            total_modules: entries.len(),
            total_installs: events.len(),
            modules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HubError;
    use tempfile::TempDir;

    fn entry(name: &str) -> ModuleEntry {
        ModuleEntry {
            name: name.to_string(),
            kind: ModuleKind::Component,
            lang: "python".to_string(),
            summary: String::new(),
            tags: vec!["x".to_string()],
            path: name.to_string(),
        }
    }

    #[test]
    fn test_record_appends() {
        let temp_dir = TempDir::new().unwrap();
        let store = StatsStore::new(temp_dir.path().join("stats.json"));
        assert!(store.events().unwrap().is_empty());

        store.record("a", "/tmp/x").unwrap();
        store.record("a", "/tmp/x").unwrap();
        store.record("b", "/tmp/y").unwrap();

        let events = store.events().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].module, "b");
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_document_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stats.json");
        StatsStore::new(&path).record("a", "/tmp/x").unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let event = &raw["installs"][0];
        assert_eq!(event["module"], "a");
        assert_eq!(event["target_dir"], "/tmp/x");
        let ts = event["timestamp"].as_str().unwrap();
        assert!(ts.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn test_aggregate() {
        let temp_dir = TempDir::new().unwrap();
        let store = StatsStore::new(temp_dir.path().join("stats.json"));
        store.record("a", "/x").unwrap();
        store.record("a", "/y").unwrap();
        store.record("removed", "/z").unwrap();

        let summary = store.aggregate(&[entry("a"), entry("b")]).unwrap();
        assert_eq!(summary.total_modules, 2);
        assert_eq!(summary.total_installs, 3);
        assert_eq!(summary.modules[0].installs, 2);
        assert_eq!(summary.modules[1].installs, 0);
        assert_eq!(summary.modules[1].tags, vec!["x"]);
    }

    #[test]
    fn test_malformed_log_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stats.json");
        std::fs::write(&path, r#"{"installs": "nope"}"#).unwrap();

        let store = StatsStore::new(&path);
        assert!(matches!(store.events(), Err(HubError::Malformed { .. })));
        assert!(matches!(store.record("a", "/x"), Err(HubError::Malformed { .. })));
        // The corrupt file is left untouched
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"installs": "nope"}"#
        );
    }
}
