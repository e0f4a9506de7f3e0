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

use axum::{extract::State, Json};
use modhub_core::StatsSummary;
use std::sync::Arc;
use tracing::error;

use crate::api::{ApiError, AppState};

/// GET /api/stats - registry joined with install counts
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsSummary>, ApiError> {
    let hub = Arc::clone(&state.hub);
    let summary = tokio::task::spawn_blocking(move || hub.stats())
        .await
        .map_err(|e| ApiError::Internal(format!("Stats task failed: {}", e)))?
        .map_err(|e| {
            error!(error = %e, "Failed to aggregate install stats");
            ApiError::Internal(e.to_string())
        })?;

    Ok(Json(summary))
}
