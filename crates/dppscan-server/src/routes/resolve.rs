//! Diagnostic resolution route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use dppscan_core::Error;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/resolve", post(run_diagnose))
}

#[derive(Deserialize)]
struct ResolveRequest {
    identifier: String,
}

/// POST /api/resolve — run every strategy against one identifier and
/// report each attempt, for debugging misbehaving endpoints.
async fn run_diagnose(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> impl IntoResponse {
    match state.resolver.diagnose(&req.identifier).await {
        Ok(report) => (StatusCode::OK, Json(serde_json::json!(report))),
        Err(Error::InvalidInput(msg)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": msg })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}
