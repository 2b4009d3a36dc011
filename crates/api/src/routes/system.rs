//! Health and Prometheus endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use store::OrderStore;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub order_store: &'static str,
}

/// GET /health — liveness plus the order store backend in use.
pub async fn health<O: OrderStore + 'static>(
    State(state): State<Arc<AppState<O>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        order_store: state.order_store_kind,
    })
}

/// GET /metrics — Prometheus text exposition.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
