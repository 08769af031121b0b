//! HTTP request handlers.
//!
//! - `wms`: the dispatcher and buffered response type
//! - `capabilities`, `getmap`, `getfeatureinfo`, `metadata`, `kml`: one
//!   module per operation
//! - `common`: parameter parsing and provider calls shared by the operations
//! - `http`: axum handlers for `/wms`, `/health` and the metrics endpoints

mod capabilities;
mod common;
mod getfeatureinfo;
mod getmap;
pub mod http;
mod kml;
mod metadata;
pub mod wms;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use http::{api_metrics_handler, health_handler, metrics_handler, wms_handler};
pub use wms::{request_label, WmsResponse, WmsService, OPERATIONS};

use crate::state::AppState;

/// Build the service router.
pub fn router(state: Arc<AppState>, prometheus: Option<PrometheusHandle>) -> Router {
    Router::new()
        .route("/wms", get(wms_handler))
        .route("/wms/", get(wms_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/metrics", get(api_metrics_handler))
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
