//! Scan routes — negotiate one passport, classify it, persist the result.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use dppscan_classify::{classify, extract_product_info, score};
use dppscan_core::Error;
use dppscan_resolve::Resolution;
use dppscan_store::ScanOutcome;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scan", post(run_scan))
        .route("/scans", get(list_scans))
        .route("/scans/{id}", get(get_scan).delete(delete_scan))
}

#[derive(Deserialize)]
struct ScanRequest {
    url: String,
}

/// POST /api/scan — resolve, classify, score, persist.
async fn run_scan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanRequest>,
) -> impl IntoResponse {
    let resolution = match state.resolver.resolve(&req.url).await {
        Ok(r) => r,
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

    let failure = resolution.failure_summary();
    match resolution {
        Resolution::Resolved(doc) => {
            let classification = classify(&doc.data, doc.content_type.as_deref());
            let scores = score(&doc.data, classification.format);
            let product = extract_product_info(&doc.data, classification.format);

            let outcome = ScanOutcome {
                payload: Some(doc.data.clone()),
                format: Some(classification.format.label().to_string()),
                rule: Some(classification.rule.to_string()),
                trust_score: Some(scores.trust_score),
                completeness_score: Some(scores.completeness_score),
                strategy: Some(doc.strategy.name().to_string()),
                content_type: doc.content_type.clone(),
                size_bytes: Some(doc.size_bytes),
                error: None,
                fetched_at: Some(chrono::Utc::now().to_rfc3339()),
            };
            let id = match state.store.save_scan(&req.url, &outcome) {
                Ok(id) => id,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({ "error": e.to_string() })),
                    );
                }
            };

            info!("scanned {} via {}", req.url, doc.strategy.name());
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": true,
                    "id": id,
                    "url": doc.url,
                    "format": classification.format,
                    "formatLabel": classification.format.label(),
                    "rule": classification.rule,
                    "strategy": doc.strategy,
                    "contentType": doc.content_type,
                    "sizeBytes": doc.size_bytes,
                    "trustScore": scores.trust_score,
                    "completenessScore": scores.completeness_score,
                    "product": product,
                    "data": doc.data,
                })),
            )
        }
        Resolution::Exhausted { attempts } => {
            let outcome = ScanOutcome {
                error: Some(failure.clone()),
                ..Default::default()
            };
            let id = match state.store.save_scan(&req.url, &outcome) {
                Ok(id) => id,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({ "error": e.to_string() })),
                    );
                }
            };

            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": false,
                    "id": id,
                    "url": req.url,
                    "error": failure,
                    "attempts": attempts,
                })),
            )
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

/// GET /api/scans?limit= — recent scan history.
async fn list_scans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match state.store.list_recent(query.limit.unwrap_or(10)) {
        Ok(scans) => (
            StatusCode::OK,
            Json(serde_json::json!({ "scans": scans, "total": scans.len() })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

/// GET /api/scans/{id}.
async fn get_scan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store.get_scan(id) {
        Ok(Some(record)) => (StatusCode::OK, Json(serde_json::json!(record))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("scan {} not found", id) })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

/// DELETE /api/scans/{id}.
async fn delete_scan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.store.delete_scan(id) {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "deleted": id }))),
        Err(Error::NotFound(msg)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": msg })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}
