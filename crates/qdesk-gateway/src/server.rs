// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use qdesk_bus::EventBus;
use qdesk_core::QdeskError;
use qdesk_engine::Engine;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Issuance, calling desk and read models.
    pub engine: Engine,
    /// Event bus the WebSocket endpoint subscribes to.
    pub bus: Arc<EventBus>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(engine: Engine, bus: Arc<EventBus>) -> Self {
        Self {
            engine,
            bus,
            start_time: Instant::now(),
        }
    }
}

/// Gateway server configuration (mirrors `GatewayConfig` from qdesk-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Bearer token for `/v1` (None = open).
    pub bearer_token: Option<String>,
}

/// Builds the full route table.
///
/// - `GET /health` and `GET /ws` are public
/// - everything under `/v1` passes through [`auth_middleware`]
pub fn router(state: GatewayState, auth: AuthConfig) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/ws", get(ws::ws_handler))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/tickets", post(handlers::issue_ticket))
        .route("/v1/tickets/{number}/status", get(handlers::ticket_status))
        .route("/v1/tickets/{id}/serve", post(handlers::start_serving))
        .route("/v1/tickets/{id}/pass", post(handlers::pass))
        .route("/v1/tickets/{id}/done", post(handlers::done))
        .route("/v1/tickets/{id}/return", post(handlers::return_to_queue))
        .route("/v1/tickets/{id}/transfer", post(handlers::transfer))
        .route(
            "/v1/tickets/{id}/toggle-priority",
            post(handlers::toggle_priority),
        )
        .route("/v1/rooms", get(handlers::room_overview))
        .route("/v1/rooms/{id}/call-next", post(handlers::call_next))
        .route("/v1/rooms/{id}/recall", post(handlers::recall))
        .route("/v1/rooms/{id}/desk", get(handlers::desk_state))
        .route("/v1/rooms/{id}/queue", get(handlers::queue))
        .route("/v1/rooms/{id}/status", get(handlers::queue_status))
        .route("/v1/displays/{id}", get(handlers::display_board))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `host:port` and serves until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), QdeskError> {
    let app = router(
        state,
        AuthConfig {
            bearer_token: config.bearer_token.clone(),
        },
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| QdeskError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(%addr, auth = config.bearer_token.is_some(), "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| QdeskError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
