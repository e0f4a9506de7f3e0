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

//! Keyword search over registry entries
//!
//! Scoring is additive per keyword:
//!
//! ```text
//! score(entry) = Σ_kw 10·[kw ∈ tags] + 5·[kw ⊂ name] + 1·[kw ⊂ summary]
//! ```
//!
//! All comparisons are on lowercased text. An empty query browses the whole
//! registry unscored.

use crate::registry::{ModuleEntry, ModuleKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Weight of a keyword equal to a tag
pub const TAG_WEIGHT: u32 = 10;
/// Weight of a keyword contained in the module name
pub const NAME_WEIGHT: u32 = 5;
/// Weight of a keyword contained in the summary
pub const SUMMARY_WEIGHT: u32 = 1;

/// Search result row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub lang: String,
    pub summary: String,
}

impl From<&ModuleEntry> for SearchHit {
    fn from(entry: &ModuleEntry) -> Self {
        Self {
            name: entry.name.clone(),
            kind: entry.kind,
            lang: entry.lang.clone(),
            summary: entry.summary.clone(),
        }
    }
}

/// Lowercased whitespace-separated keywords
pub fn keywords(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Relevance of `entry` for the given (already lowercased) keywords
pub fn score(entry: &ModuleEntry, keywords: &[String]) -> u32 {
    let tags: Vec<String> = entry.tags.iter().map(|t| t.to_lowercase()).collect();
    let name = entry.name.to_lowercase();
    let summary = entry.summary.to_lowercase();

    keywords
        .iter()
        .map(|kw| {
            let mut s = 0;
            if tags.iter().any(|t| t == kw) {
                s += TAG_WEIGHT;
            }
            if name.contains(kw.as_str()) {
                s += NAME_WEIGHT;
            }
            if summary.contains(kw.as_str()) {
                s += SUMMARY_WEIGHT;
            }
            s
        })
        .sum()
}

/// Rank `entries` against `query`.
///
/// Blank query: every entry in registry order. Otherwise entries scoring
/// above zero, highest first; ties keep registry order.
pub fn search(entries: &[ModuleEntry], query: &str) -> Vec<SearchHit> {
    let keywords = keywords(query);
    if keywords.is_empty() {
        return entries.iter().map(SearchHit::from).collect();
    }

    let mut scored: Vec<(u32, SearchHit)> = entries
        .iter()
        .filter_map(|entry| {
            let s = score(entry, &keywords);
            debug!(module = %entry.name, score = s, "Scored module");
            (s > 0).then(|| (s, SearchHit::from(entry)))
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, hit)| hit).collect()
}
