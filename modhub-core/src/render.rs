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

//! API document rendering
//!
//! Produces the markdown shown by `get_module_api`. Only manifest metadata is
//! used; module source files are never read here.

use crate::manifest::ModuleManifest;

/// Render the API document for a manifest.
///
/// Sections appear in a fixed order and only when their data is present.
pub fn render_api_doc(manifest: &ModuleManifest) -> String {
    let mut parts = vec![
        format!("# {}", manifest.name),
        format!(
            "\n**Type:** {} | **Language:** {}",
            manifest.kind, manifest.lang
        ),
        format!("\n**Summary:** {}", manifest.summary),
    ];

    if let Some(install) = manifest.install.as_ref().filter(|i| !i.is_empty()) {
        parts.push("\n## Installation".to_string());
        if !install.dependencies.is_empty() {
            parts.push(format!("Dependencies: {}", install.dependencies.join(", ")));
        }
        if let Some(entry) = install.entry() {
            parts.push(format!("Import: `{}`", entry));
        }
    }

    if let Some(api) = manifest.api() {
        parts.push("\n## API".to_string());
        // Value serialization cannot fail
        parts.push(serde_json::to_string_pretty(api).unwrap_or_else(|_| api.to_string()));
    }

    if !manifest.adapt_points.is_empty() {
        parts.push("\n## Adaptation Points".to_string());
        parts.extend(manifest.adapt_points.iter().map(|p| format!("- {}", p)));
    }

    if !manifest.design_decisions.is_empty() {
        parts.push("\n## Design Decisions".to_string());
        parts.extend(manifest.design_decisions.iter().map(|d| format!("- {}", d)));
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::InstallSpec;
    use crate::registry::ModuleKind;
    use serde_json::json;

    fn manifest(kind: ModuleKind) -> ModuleManifest {
        ModuleManifest {
            name: "sqlmodel-crud-pattern".to_string(),
            kind,
            lang: "python".to_string(),
            summary: "Generic CRUD helpers".to_string(),
            tags: vec![],
            install: None,
            api: None,
            adapt_points: vec![],
            design_decisions: vec![],
        }
    }

    #[test]
    fn test_minimal_document() {
        let doc = render_api_doc(&manifest(ModuleKind::Utility));
        assert_eq!(
            doc,
            "# sqlmodel-crud-pattern\n\n**Type:** utility | **Language:** python\n\n**Summary:** Generic CRUD helpers"
        );
    }

    #[test]
    fn test_full_document_order() {
        let mut m = manifest(ModuleKind::Component);
        m.install = Some(InstallSpec {
            dependencies: vec!["sqlmodel".to_string(), "fastapi".to_string()],
            entry: Some("from crud import CRUDBase".to_string()),
        });
        m.api = Some(json!({"CRUDBase": {"get": "(session, id) -> Model | None"}}));
        m.adapt_points = vec!["Model type".to_string(), "Session source".to_string()];
        m.design_decisions = vec!["Generic over model".to_string()];

        let doc = render_api_doc(&m);

        let install = doc.find("## Installation").unwrap();
        let api = doc.find("## API").unwrap();
        let adapt = doc.find("## Adaptation Points").unwrap();
        let design = doc.find("## Design Decisions").unwrap();
        assert!(install < api && api < adapt && adapt < design);

        assert!(doc.contains("Dependencies: sqlmodel, fastapi"));
        assert!(doc.contains("Import: `from crud import CRUDBase`"));
        assert!(doc.contains("\"CRUDBase\": {"));
        assert!(doc.contains("- Model type\n- Session source"));
        assert!(doc.contains("- Generic over model"));
    }

    #[test]
    fn test_empty_install_section_omitted() {
        let mut m = manifest(ModuleKind::Utility);
        m.install = Some(InstallSpec::default());
        assert!(!render_api_doc(&m).contains("## Installation"));

        m.install = Some(InstallSpec {
            dependencies: vec![],
            entry: Some("import config".to_string()),
        });
        let doc = render_api_doc(&m);
        assert!(doc.contains("## Installation\nImport: `import config`"));
        assert!(!doc.contains("Dependencies:"));
    }
}
