//! Health check and Prometheus metrics.

use axum::{extract::Extension, http::header, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{json, Value};

/// GET /api/health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Nimbus API is running!"
    }))
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}
