//! Gridded-data WMS service library.
//!
//! Exposes the server's modules so the binary and the integration tests
//! share one router.

pub mod cache_wiper;
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod provider;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use handlers::{router, WmsResponse, WmsService};
pub use provider::GridFileProvider;
pub use state::AppState;
