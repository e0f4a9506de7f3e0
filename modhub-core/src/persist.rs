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

//! Whole-document JSON persistence shared by the registry and statistics stores.

use crate::error::{HubError, HubResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Read and parse a JSON document.
///
/// A missing file yields `Ok(None)`. A file that exists but does not parse
/// is a `Malformed` error, never an empty document.
pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> HubResult<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(HubError::io(path, e)),
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| HubError::malformed(path, e))
}

/// Replace a JSON document on disk.
///
/// Pretty-printed with a trailing newline, written to a sibling temp file and
/// renamed over the target so readers never observe a half-written file.
pub(crate) fn write_document<T: Serialize>(path: &Path, document: &T) -> HubResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| HubError::io(parent, e))?;
    }

    let mut contents = serde_json::to_string_pretty(document)?;
    contents.push('\n');

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    {
        let mut file = fs::File::create(temp_path).map_err(|e| HubError::io(temp_path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| HubError::io(temp_path, e))?;
        file.sync_all().map_err(|e| HubError::io(temp_path, e))?;
    }

    fs::rename(temp_path, path).map_err(|e| HubError::io(path, e))
}
