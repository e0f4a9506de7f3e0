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

//! Module hub error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type for hub operations
pub type HubResult<T> = Result<T, HubError>;

/// Errors that can occur while serving the module catalog
#[derive(Debug, Error)]
pub enum HubError {
    // Lookup errors
    #[error("Module '{0}' does not exist")]
    ModuleNotFound(String),

    #[error("Module '{0}' has no manifest.json")]
    ManifestMissing(String),

    #[error("Source directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),

    // Policy errors
    #[error(
        "Module '{0}' is a blueprint and cannot be installed; use get_module_api to read its architecture guidance"
    )]
    BlueprintNotInstallable(String),

    // Persisted state errors
    #[error("Malformed file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Filesystem errors
    #[error("Copy failed after {} file(s): {source}", copied.len())]
    CopyFailed {
        copied: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registration failed: {0}")]
    Registration(String),
}

impl HubError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HubError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        HubError::Malformed {
            path: path.into(),
            source,
        }
    }

    /// True for failures the caller caused (unknown names, missing files,
    /// blueprint installs). These are reported as plain text rather than
    /// as an error result.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            HubError::ModuleNotFound(_)
                | HubError::ManifestMissing(_)
                | HubError::SourceMissing(_)
                | HubError::BlueprintNotInstallable(_)
                | HubError::CopyFailed { .. }
        )
    }
}
