//! Application state and shared resources.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::handlers::WmsService;
use crate::metrics::MetricsCollector;
use wms_common::DatasetProvider;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    pub service: WmsService,
    pub metrics: MetricsCollector,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, provider: Arc<dyn DatasetProvider>) -> Self {
        Self {
            service: WmsService::new(config, provider),
            metrics: MetricsCollector::new(),
        }
    }
}
