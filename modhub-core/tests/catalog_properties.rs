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

// End-to-end behavior of the catalog engine against a temp catalog on disk.

use modhub_core::{
    CatalogConfig, HubError, ModuleEntry, ModuleHub, ModuleKind, RegistryStore, SearchHit,
};
use proptest::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Catalog {
    dir: TempDir,
    hub: ModuleHub,
}

impl Catalog {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let hub = ModuleHub::new(&CatalogConfig::rooted_at(dir.path()));
        Self { dir, hub }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn add(&self, rel: &str, manifest: serde_json::Value, files: &[(&str, &[u8])]) {
        let module_dir = self.root().join("modules").join(rel);
        fs::create_dir_all(&module_dir).unwrap();
        fs::write(module_dir.join("manifest.json"), manifest.to_string()).unwrap();
        for (path, contents) in files {
            let file = module_dir.join("src").join(path);
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, contents).unwrap();
        }
        self.hub.register(Path::new(rel)).unwrap();
    }

    fn seed(&self) {
        self.add(
            "utilities/python/http-client",
            json!({
                "name": "http-client",
                "type": "utility",
                "lang": "python",
                "summary": "simple http client",
                "tags": ["http", "network"],
                "install": {"dependencies": ["httpx"], "entry": "from http_client import get"}
            }),
            &[("a.py", b"import httpx\n"), ("sub/b.py", b"\x00\x01binary\xff")],
        );
        self.add(
            "blueprints/python/layered-service",
            json!({
                "name": "layered-service",
                "type": "blueprint",
                "lang": "python",
                "summary": "Layered service architecture",
                "tags": ["architecture"],
                "design_decisions": ["Routers never touch the ORM directly"]
            }),
            &[("never.py", b"")],
        );
    }

    fn target(&self) -> PathBuf {
        self.root().join("project").join("lib")
    }

    fn install_count(&self) -> usize {
        self.hub.stats_store().events().unwrap().len()
    }
}

fn names(hits: &[SearchHit]) -> Vec<String> {
    hits.iter().map(|h| h.name.clone()).collect()
}

#[test]
fn scoring_matches_weights() {
    let catalog = Catalog::new();
    catalog.seed();

    let entry = catalog.hub.registry().find_by_name("http-client").unwrap().unwrap();
    let keywords = modhub_core::search::keywords("http");
    assert_eq!(modhub_core::search::score(&entry, &keywords), 16);
}

#[test]
fn empty_query_is_browse_mode() {
    let catalog = Catalog::new();
    catalog.seed();

    let all = catalog.hub.search("").unwrap();
    assert_eq!(names(&all), vec!["http-client", "layered-service"]);
    assert!(catalog.hub.search("zebra").unwrap().is_empty());
}

#[test]
fn blueprint_install_is_rejected_without_side_effects() {
    let catalog = Catalog::new();
    catalog.seed();
    let target = catalog.target();

    let text = catalog
        .hub
        .install_text("layered-service", target.to_str().unwrap())
        .unwrap();
    assert!(text.contains("get_module_api"));
    assert!(!target.exists());
    assert_eq!(catalog.install_count(), 0);

    // Describing a blueprint still works
    let doc = catalog.hub.describe_text("layered-service").unwrap();
    assert!(doc.contains("## Design Decisions\n- Routers never touch the ORM directly"));
}

#[test]
fn install_copies_bytes_exactly() {
    let catalog = Catalog::new();
    catalog.seed();
    let target = catalog.target();

    let report = catalog
        .hub
        .install("http-client", target.to_str().unwrap())
        .unwrap();

    let dest = target.join("http_client");
    assert_eq!(report.copied, vec!["a.py", "sub/b.py"]);
    assert_eq!(fs::read(dest.join("a.py")).unwrap(), b"import httpx\n");
    assert_eq!(fs::read(dest.join("sub/b.py")).unwrap(), b"\x00\x01binary\xff");
    assert_eq!(report.entry.as_deref(), Some("from http_client import get"));
}

#[test]
fn installs_are_counted_monotonically() {
    let catalog = Catalog::new();
    catalog.seed();
    let target = catalog.target();
    let target = target.to_str().unwrap();

    let before = catalog.install_count();
    for _ in 0..3 {
        catalog.hub.install("http-client", target).unwrap();
    }
    // Failed installs leave no trace
    let _ = catalog.hub.install_text("layered-service", target).unwrap();
    let _ = catalog.hub.install_text("ghost", target).unwrap();

    let events = catalog.hub.stats_store().events().unwrap();
    assert_eq!(events.len(), before + 3);
    assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let summary = catalog.hub.stats().unwrap();
    assert_eq!(summary.total_modules, 2);
    assert_eq!(summary.total_installs, 3);
    assert_eq!(summary.modules[0].installs, 3);
    assert_eq!(summary.modules[1].installs, 0);
}

#[test]
fn unknown_module_has_no_side_effects() {
    let catalog = Catalog::new();
    catalog.seed();
    let target = catalog.root().join("x");

    assert_eq!(
        catalog.hub.describe_text("nonexistent").unwrap(),
        "Module 'nonexistent' does not exist"
    );
    assert_eq!(
        catalog
            .hub
            .install_text("nonexistent", target.to_str().unwrap())
            .unwrap(),
        "Module 'nonexistent' does not exist"
    );
    assert!(!target.exists());
    assert!(!catalog.root().join("install_stats.json").exists());
}

#[test]
fn missing_manifest_is_reported() {
    let catalog = Catalog::new();
    catalog.seed();
    fs::remove_file(
        catalog
            .root()
            .join("modules/utilities/python/http-client/manifest.json"),
    )
    .unwrap();

    let target = catalog.target();
    let text = catalog
        .hub
        .install_text("http-client", target.to_str().unwrap())
        .unwrap();
    assert_eq!(text, "Module 'http-client' has no manifest.json");
    assert!(!target.exists());
    assert!(matches!(
        catalog.hub.describe("http-client"),
        Err(HubError::ManifestMissing(_))
    ));
}

fn arb_entry() -> impl Strategy<Value = ModuleEntry> {
    (
        "[a-e]{1,2}",
        prop_oneof![
            Just(ModuleKind::Utility),
            Just(ModuleKind::Component),
            Just(ModuleKind::Blueprint)
        ],
        "[a-z ]{0,12}",
        proptest::collection::vec("[a-z]{1,4}", 0..3),
    )
        .prop_map(|(name, kind, summary, tags)| ModuleEntry {
            path: format!("m/{}", name),
            name,
            kind,
            lang: "python".to_string(),
            summary,
            tags,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn registration_keeps_names_unique(entries in proptest::collection::vec(arb_entry(), 1..12)) {
        let dir = TempDir::new().unwrap();
        let store = RegistryStore::new(dir.path().join("registry.json"));

        for entry in &entries {
            store.upsert(entry.clone()).unwrap();
        }
        let stored = store.load().unwrap();

        // Expected order: each name at the position of its last registration
        let mut expected: Vec<ModuleEntry> = Vec::new();
        for entry in &entries {
            expected.retain(|e| e.name != entry.name);
            expected.push(entry.clone());
        }
        prop_assert_eq!(&stored, &expected);

        for entry in &stored {
            prop_assert_eq!(stored.iter().filter(|e| e.name == entry.name).count(), 1);
        }
    }

    #[test]
    fn search_results_are_sorted_and_positive(
        entries in proptest::collection::vec(arb_entry(), 0..10),
        query in "[a-e ]{1,6}",
    ) {
        let hits = modhub_core::search::search(&entries, &query);
        let keywords = modhub_core::search::keywords(&query);

        if keywords.is_empty() {
            prop_assert_eq!(hits.len(), entries.len());
        } else {
            let mut expected: Vec<(u32, &ModuleEntry)> = entries
                .iter()
                .map(|e| (modhub_core::search::score(e, &keywords), e))
                .filter(|(s, _)| *s > 0)
                .collect();
            expected.sort_by(|a, b| b.0.cmp(&a.0));
            let expected: Vec<SearchHit> =
                expected.into_iter().map(|(_, e)| SearchHit::from(e)).collect();
            prop_assert_eq!(hits, expected);
        }
    }
}
