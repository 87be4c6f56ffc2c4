use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Load generator control ──────────────────────────────
        .route("/api/load/start", post(handlers::load::start_load))
        .route("/api/load/stop", post(handlers::load::stop_load))
        .route("/api/load/status", get(handlers::load::load_status))
        // ── Metrics ─────────────────────────────────────────────
        .route("/api/metrics", get(handlers::metrics::get_metrics))
        .route("/api/metrics/http", get(handlers::metrics::get_http_metrics))
        .route("/api/metrics/stream", get(handlers::metrics::metrics_stream))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            timing::timing_middleware,
        ))
        .layer(CorsLayer::permissive())
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
}
