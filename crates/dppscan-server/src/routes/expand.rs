//! Graph expansion route.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use dppscan_core::Error;
use dppscan_graph::{build_graph_structure, expand, merge_resolved, ExpandOptions};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/expand", post(run_expand))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpandRequest {
    root: Value,
    #[serde(default)]
    max_depth: Option<usize>,
    #[serde(default)]
    max_links: Option<usize>,
    #[serde(default)]
    per_request_timeout_ms: Option<u64>,
    #[serde(default)]
    global_timeout_ms: Option<u64>,
    #[serde(default)]
    convert_did: Option<bool>,
    #[serde(default)]
    concurrency: Option<usize>,
}

/// POST /api/expand — follow every reference in a root document and
/// return the bounded graph plus render structure and merged view.
async fn run_expand(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExpandRequest>,
) -> impl IntoResponse {
    let defaults = ExpandOptions::default();
    let options = ExpandOptions {
        max_depth: req.max_depth.unwrap_or(defaults.max_depth),
        max_links: req.max_links.unwrap_or(defaults.max_links),
        per_request_timeout: req
            .per_request_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.per_request_timeout),
        global_timeout: req.global_timeout_ms.map(Duration::from_millis),
        convert_did: req.convert_did.unwrap_or(defaults.convert_did),
        concurrency: req.concurrency.unwrap_or(defaults.concurrency),
        user_agent: state.config.user_agent.clone(),
        ..Default::default()
    };

    match expand(&req.root, options).await {
        Ok(graph) => {
            info!(
                "expanded graph: {} links ({} resolved)",
                graph.stats.total, graph.stats.resolved
            );
            let structure = build_graph_structure(&graph);
            let merged = merge_resolved(&graph);
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "graph": graph,
                    "structure": structure,
                    "merged": merged,
                })),
            )
        }
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
