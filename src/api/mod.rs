// HTTP API for dashboards: current indicator state, health, and metrics.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::indicator::SharedIndicator;
use crate::metrics;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub indicator: SharedIndicator,
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(indicator: SharedIndicator) -> Router {
    let state = AppState { indicator };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/indicator", get(get_indicator))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "duel-lords-status" }))
}

async fn get_indicator(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.indicator.snapshot()))
}

async fn get_metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}
