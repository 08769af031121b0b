//! Axum handlers: the WMS endpoint plus health and metrics.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Extension, RawQuery},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{error, instrument};
use wms_common::WmsError;

use super::wms::{request_label, WmsResponse};
use crate::metrics::MetricsSnapshot;
use crate::state::AppState;

/// GET /wms - every WMS operation. Exceptions are answered with 200 too.
#[instrument(skip(state))]
pub async fn wms_handler(
    Extension(state): Extension<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = query.unwrap_or_default();
    let label = request_label(&query);
    let start = Instant::now();

    let worker_state = state.clone();
    let result =
        tokio::task::spawn_blocking(move || worker_state.service.handle(&query)).await;

    match result {
        Ok(response) => {
            state
                .metrics
                .record_request(label, start.elapsed(), response.error.as_ref());
            into_http(response)
        }
        Err(e) => {
            error!(error = %e, request = label, "WMS worker task failed");
            let response =
                WmsResponse::exception(WmsError::Internal("request worker failed".into()));
            state
                .metrics
                .record_request(label, start.elapsed(), response.error.as_ref());
            let mut http = into_http(response);
            *http.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            http
        }
    }
}

fn into_http(response: WmsResponse) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}

/// GET /health - Health check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(
    Extension(prometheus): Extension<Option<PrometheusHandle>>,
) -> Response {
    match prometheus {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed").into_response(),
    }
}

/// GET /api/metrics - JSON counters and request timings
pub async fn api_metrics_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
