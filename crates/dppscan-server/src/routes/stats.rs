//! Stats and health routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(get_health))
        .route("/stats", get(get_stats))
}

/// GET /api/health — liveness probe.
async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "dppscan",
    }))
}

/// GET /api/stats — scan history statistics.
async fn get_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.store.get_stats().unwrap_or(dppscan_store::ScanStats {
        total: 0,
        completed: 0,
        failed: 0,
        last_24h: 0,
        db_size_mb: 0.0,
    });

    Json(serde_json::json!({
        "total": stats.total,
        "completed": stats.completed,
        "failed": stats.failed,
        "last24h": stats.last_24h,
        "dbSizeMb": stats.db_size_mb,
    }))
}
