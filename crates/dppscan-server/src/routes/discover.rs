//! Well-known endpoint discovery route.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use dppscan_core::Error;
use dppscan_resolve::WELL_KNOWN_PATHS;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/discover", post(run_discover))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoverRequest {
    base_url: String,
}

/// POST /api/discover — probe the well-known discovery paths on an origin
/// and report what answered.
async fn run_discover(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DiscoverRequest>,
) -> impl IntoResponse {
    let results = match state.resolver.discover_well_known(&req.base_url).await {
        Ok(results) => results,
        Err(Error::InvalidInput(msg)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": msg })),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            );
        }
    };

    let found: Vec<&str> = results
        .iter()
        .filter(|r| r.found)
        .map(|r| r.url.as_str())
        .collect();
    let recommendation = if let Some(first) = found.first() {
        format!("Found {} endpoint(s). Try: {}", found.len(), first)
    } else {
        "No well-known endpoints found on this origin.".to_string()
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "baseUrl": req.base_url,
            "pathsChecked": WELL_KNOWN_PATHS.len(),
            "endpointsFound": found.len(),
            "results": results,
            "recommendation": recommendation,
        })),
    )
}
