use axum::http::StatusCode;

use crate::services::metrics::get_metrics;

/// Prometheus text exposition endpoint.
pub async fn metrics() -> (StatusCode, String) {
    (StatusCode::OK, get_metrics())
}
