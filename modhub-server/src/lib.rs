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

//! Modhub server
//!
//! Serves the module catalog to coding assistants over MCP (stdio or HTTP)
//! and hosts a small usage dashboard. All catalog behavior lives in
//! `modhub-core`; this crate is transport and presentation.

pub mod api;
pub mod config;
pub mod mcp;

use anyhow::Result;
use axum::{http::HeaderValue, routing::get, Router};
use modhub_core::ModuleHub;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt};

use api::{dashboard, get_stats, health_check, AppState};
use config::{HttpServerConfig, ServerConfig};
use mcp::{serve_transport, McpHandler, McpServer, StdioTransport};

/// Filter used when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "modhub_server=info,modhub_core=info,tower_http=info";

/// Install the global tracing subscriber.
///
/// `to_stderr` keeps stdout free for protocol traffic in stdio mode.
pub fn init_tracing(json: bool, to_stderr: bool) -> Result<()> {
    let writer = if to_stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(writer))
            .try_init()?;
    }
    Ok(())
}

/// Full HTTP application: dashboard, stats API, health and MCP endpoints
pub fn build_router(hub: Arc<ModuleHub>, config: &HttpServerConfig) -> Result<Router> {
    let handler = Arc::new(McpHandler::new(Arc::clone(&hub))?);
    let mcp_server = McpServer::new(handler);

    let app = Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health_check))
        .route("/api/stats", get(get_stats))
        .with_state(AppState { hub })
        .merge(mcp_server.router())
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
    if !config.enable_cors {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.is_empty() {
        tracing::warn!("CORS: Allowing all origins. Set cors_origins to restrict.");
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    tracing::info!("CORS: Allowing origins: {:?}", config.cors_origins);
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Serve the dashboard and MCP over HTTP until Ctrl-C
pub async fn run_server(config: ServerConfig) -> Result<()> {
    tracing::info!("Starting Modhub Server");
    tracing::debug!("Configuration: {:#?}", config);

    config.validate()?;
    let addr = config.socket_addr()?;

    let hub = Arc::new(ModuleHub::new(&config.catalog));
    tracing::info!(
        registry = %config.catalog.registry_path.display(),
        modules_root = %config.catalog.modules_root.display(),
        stats = %config.catalog.stats_path.display(),
        "Catalog configured"
    );

    let app = build_router(hub, &config.server)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Dashboard listening on http://{}", addr);
    tracing::info!("MCP endpoints: POST /mcp, GET /sse");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Serve MCP over stdin/stdout until stdin closes
pub async fn run_stdio(config: ServerConfig) -> Result<()> {
    config.catalog.validate().map_err(anyhow::Error::msg)?;

    let hub = Arc::new(ModuleHub::new(&config.catalog));
    let handler = McpHandler::new(hub)?;
    tracing::info!(
        registry = %config.catalog.registry_path.display(),
        "Serving MCP over stdio"
    );

    let mut transport = StdioTransport::stdio();
    serve_transport(&handler, &mut transport).await?;

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
