//! The WMS request dispatcher.
//!
//! [`WmsService::handle`] takes a raw query string and always produces a
//! buffered response: either the operation's output or a
//! ServiceExceptionReport. Nothing in here is async; the HTTP layer runs it
//! on the blocking pool.

use std::sync::Arc;

use tracing::{debug, error};
use wms_common::{CrsRegistry, DatasetProvider, DatasetRegistry, WmsError, WmsResult};
use wms_protocol::{fallback_report, service_exception_report, KvpParams, EXCEPTION_CONTENT_TYPE};

use super::{capabilities, getfeatureinfo, getmap, kml, metadata};
use crate::config::ServerConfig;

/// Operations this server answers, as they appear in REQUEST.
pub const OPERATIONS: [&str; 6] = [
    "GetCapabilities",
    "GetMap",
    "GetFeatureInfo",
    "GetMetadata",
    "GetKML",
    "GetKMLRegion",
];

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq)]
pub struct WmsResponse {
    pub content_type: String,
    pub body: Vec<u8>,
    /// Set when the body is an exception report.
    pub error: Option<WmsError>,
}

impl WmsResponse {
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
            error: None,
        }
    }

    pub fn xml(body: String) -> Self {
        Self::new("text/xml", body)
    }

    /// Serialize an error as a ServiceExceptionReport.
    pub fn exception(err: WmsError) -> Self {
        let body = service_exception_report(&err).unwrap_or_else(|e| {
            error!(error = %e, "Failed to write exception report");
            fallback_report(&err.to_string())
        });
        Self {
            content_type: EXCEPTION_CONTENT_TYPE.to_string(),
            body: body.into_bytes(),
            error: Some(err),
        }
    }

    pub fn is_exception(&self) -> bool {
        self.error.is_some()
    }
}

/// The WMS engine: configuration, dataset registry, CRS registry and the
/// dataset provider, all shared read-only between requests.
pub struct WmsService {
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) registry: DatasetRegistry,
    pub(crate) crs: CrsRegistry,
    pub(crate) provider: Arc<dyn DatasetProvider>,
}

impl std::fmt::Debug for WmsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WmsService")
            .field("datasets", &self.registry.datasets().len())
            .field("crs", &self.crs)
            .finish()
    }
}

impl WmsService {
    /// A service with the standard CRS:84 and EPSG:41001 grids.
    pub fn new(config: Arc<ServerConfig>, provider: Arc<dyn DatasetProvider>) -> Self {
        Self::with_crs_registry(config, provider, projection::standard_registry())
    }

    pub fn with_crs_registry(
        config: Arc<ServerConfig>,
        provider: Arc<dyn DatasetProvider>,
        crs: CrsRegistry,
    ) -> Self {
        let registry = DatasetRegistry::new(config.datasets.clone());
        Self {
            config,
            registry,
            crs,
            provider,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Handle one request. Failures become exception reports here and
    /// nowhere else.
    pub fn handle(&self, raw_query: &str) -> WmsResponse {
        let params = KvpParams::parse(raw_query);
        match self.dispatch(&params) {
            Ok(response) => response,
            Err(err) => {
                if err.is_client_error() {
                    debug!(code = ?err.code(), error = %err, "Request rejected");
                } else {
                    error!(error = %err, query = raw_query, "Request failed");
                }
                WmsResponse::exception(err)
            }
        }
    }

    fn dispatch(&self, params: &KvpParams) -> WmsResult<WmsResponse> {
        if params.is_empty() {
            return metadata::get_metadata(self, params);
        }

        if params.get("service")? != "WMS" {
            return Err(WmsError::generic("SERVICE parameter must be \"WMS\""));
        }

        match params.get("request")? {
            "GetCapabilities" => capabilities::get_capabilities(self, params),
            "GetMap" => getmap::get_map(self, params),
            "GetFeatureInfo" => {
                if !self.config.server.allow_feature_info {
                    return Err(WmsError::OperationNotSupported("GetFeatureInfo".into()));
                }
                getfeatureinfo::get_feature_info(self, params)
            }
            "GetMetadata" => metadata::get_metadata(self, params),
            "GetKML" => kml::get_kml(self, params),
            "GetKMLRegion" => kml::get_kml_region(self, params),
            other => Err(WmsError::OperationNotSupported(other.to_string())),
        }
    }
}

/// Metrics label for a request: the operation name, or `other`.
pub fn request_label(raw_query: &str) -> &'static str {
    let params = KvpParams::parse(raw_query);
    if params.is_empty() {
        return "GetMetadata";
    }
    params
        .get_opt("request")
        .and_then(|r| OPERATIONS.iter().find(|op| **op == r).copied())
        .unwrap_or("other")
}
