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

//! MCP over HTTP
//!
//! - `POST /mcp`: one JSON-RPC message in, its response out.
//! - `GET /sse` + `POST /messages?session_id=..`: the SSE transport. The
//!   stream opens with an `endpoint` event naming the session's message URL;
//!   each response is pushed back as a `message` event.

use crate::api::ApiError;
use crate::mcp::handlers::McpHandler;
use crate::mcp::protocol::*;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

/// Pending responses per SSE session before the sender waits
const SESSION_BUFFER: usize = 32;

/// MCP Server state
#[derive(Clone)]
pub struct McpServerState {
    pub handler: Arc<McpHandler>,
    pub sessions: Arc<DashMap<String, mpsc::Sender<JsonRpcResponse>>>,
}

/// MCP Server
pub struct McpServer {
    state: McpServerState,
}

impl McpServer {
    pub fn new(handler: Arc<McpHandler>) -> Self {
        Self {
            state: McpServerState {
                handler,
                sessions: Arc::new(DashMap::new()),
            },
        }
    }

    /// Get the Axum router for the MCP endpoints
    pub fn router(&self) -> Router {
        Router::new()
            .route("/mcp", post(handle_mcp_request))
            .route("/sse", get(handle_sse))
            .route("/messages", post(handle_session_message))
            .with_state(self.state.clone())
    }

    /// Get the server state (for embedding and tests)
    pub fn state(&self) -> McpServerState {
        self.state.clone()
    }
}

/// Handle MCP JSON-RPC request over HTTP POST
async fn handle_mcp_request(State(state): State<McpServerState>, body: String) -> Response {
    match state.handler.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Open an SSE session
async fn handle_sse(
    State(state): State<McpServerState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel::<JsonRpcResponse>(SESSION_BUFFER);
    state.sessions.insert(session_id.clone(), tx);
    info!(session_id = %session_id, "MCP SSE client connected");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={}", session_id));

    let guard = SessionGuard {
        sessions: Arc::clone(&state.sessions),
        session_id,
    };
    let messages = ReceiverStream::new(rx).map(move |response| {
        let _session = &guard;
        Event::default().event("message").json_data(&response)
    });

    let stream = stream::once(async move { Ok(endpoint) }).chain(messages);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Removes its session when the SSE stream is dropped
struct SessionGuard {
    sessions: Arc<DashMap<String, mpsc::Sender<JsonRpcResponse>>>,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.session_id);
        info!(session_id = %self.session_id, "MCP SSE client disconnected");
    }
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// Accept a message for an SSE session; the response goes out on its stream
async fn handle_session_message(
    State(state): State<McpServerState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Result<StatusCode, ApiError> {
    let sender = state
        .sessions
        .get(&query.session_id)
        .map(|s| s.value().clone())
        .ok_or_else(|| ApiError::NotFound(format!("Unknown session: {}", query.session_id)))?;

    let handler = Arc::clone(&state.handler);
    let sessions = Arc::clone(&state.sessions);
    tokio::spawn(async move {
        if let Some(response) = handler.handle_message(&body).await {
            if sender.send(response).await.is_err() {
                debug!(session_id = %query.session_id, "SSE client gone, dropping session");
                sessions.remove(&query.session_id);
            }
        }
    });

    Ok(StatusCode::ACCEPTED)
}
