//! HTTP route handlers.

pub mod discover;
pub mod expand;
pub mod resolve;
pub mod scan;
pub mod stats;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(stats::routes())
        .merge(scan::routes())
        .merge(resolve::routes())
        .merge(discover::routes())
        .merge(expand::routes())
}
