//! Main HTTP Gateway Server.
//!
//! Serves the signaling WebSocket and the health/status endpoints.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::Result;
use axum::{Router, http::Method, routing::get};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use tandem_core::HubHandle;

use crate::health_api;
use crate::session_registry::SessionRegistry;
use crate::ws_server;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub hub: HubHandle,
    pub sessions: SessionRegistry,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(hub: HubHandle, sessions: SessionRegistry) -> Self {
        Self {
            hub,
            sessions,
            started_at: Instant::now(),
        }
    }
}

/// Browsers connect from arbitrary origins; the service trusts none of them.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
}

pub fn build_router(state: GatewayState, ws_path: &str) -> Router {
    Router::new()
        .route(ws_path, get(ws_server::ws_handler))
        .route("/api/health", get(health_api::get_health))
        .route("/api/status", get(health_api::get_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Starts the gateway and serves until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, ws_path: &str, state: GatewayState) -> Result<()> {
    let app = build_router(state, ws_path);

    info!(%addr, ws_path, "Gateway listening");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
