//! Gridded-data WMS server.
//!
//! HTTP server implementing OGC WMS 1.3.0 over regular lon/lat datasets.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use wms_api::cache_wiper::{CacheWiper, CacheWiperConfig};
use wms_api::{router, AppState, GridFileProvider, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "wms-api")]
#[command(about = "OGC WMS 1.3.0 server for gridded data")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "WMS_LISTEN_ADDR")]
    listen: String,

    /// Server configuration file (YAML)
    #[arg(short, long, default_value = "config/server.yaml", env = "WMS_CONFIG")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "TOKIO_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .json()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))?;

    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder();
    let prometheus = match recorder {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder not installed, /metrics disabled");
            None
        }
    };

    let config = ServerConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let config = Arc::new(config);
    info!(
        title = %config.server.title,
        datasets = config.datasets.len(),
        "Starting WMS server"
    );

    let provider = Arc::new(GridFileProvider::new());
    let wiper = CacheWiper::new(
        provider.clone(),
        CacheWiperConfig::from_minutes(config.cache.refresh_minutes),
    );
    let _wiper = wiper.spawn();

    let state = Arc::new(AppState::new(config, provider));
    let app = router(state, prometheus);

    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
