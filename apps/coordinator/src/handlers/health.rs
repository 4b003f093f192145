// [apps/coordinator/src/handlers/health.rs]
//! Liveness probe and a minimal Prometheus text-format metrics surface
//! (§1's ambient observability, not one of the numbered components).

use crate::state::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    match state.database_client.get_connection() {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(fault) => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "degraded", "reason": fault.to_string() }))).into_response(),
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let worker_count = state.workers().ok();
    let gauge = match worker_count {
        Some(repo) => repo.list_workers().await.map(|w| w.len()).unwrap_or(0),
        None => 0,
    };

    let body = format!(
        "# HELP fleet_coordinator_live_bots Number of non-deleted registered bots.\n\
         # TYPE fleet_coordinator_live_bots gauge\n\
         fleet_coordinator_live_bots {gauge}\n"
    );

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
