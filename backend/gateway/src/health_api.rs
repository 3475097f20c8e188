//! Gateway Health API
//!
//! Liveness for the process and a snapshot of the matchmaking state.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use tandem_core::HubSnapshot;

use crate::server::GatewayState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// Handler for `GET /api/health`
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok".into(),
        service: "tandem".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}

/// Handler for `GET /api/status`
pub async fn get_status(
    State(state): State<GatewayState>,
) -> Result<Json<HubSnapshot>, StatusCode> {
    match state.hub.snapshot().await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => {
            error!(error = %e, "Failed to read hub snapshot");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
