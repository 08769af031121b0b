//! Background task that periodically empties the dataset cache so changed
//! files on disk are picked up.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::provider::GridFileProvider;

/// Configuration for the cache wiper.
#[derive(Debug, Clone)]
pub struct CacheWiperConfig {
    /// Time between wipes.
    pub interval: Duration,
}

impl CacheWiperConfig {
    pub fn from_minutes(minutes: u64) -> Self {
        Self {
            interval: Duration::from_secs(minutes.max(1) * 60),
        }
    }
}

/// Fixed-interval wiper for a provider's handle cache.
pub struct CacheWiper {
    provider: Arc<GridFileProvider>,
    config: CacheWiperConfig,
}

impl CacheWiper {
    pub fn new(provider: Arc<GridFileProvider>, config: CacheWiperConfig) -> Self {
        Self { provider, config }
    }

    /// Wipe once, returning the number of datasets dropped.
    pub fn run_once(&self) -> usize {
        let dropped = self.provider.clear_cache();
        if dropped > 0 {
            info!(datasets = dropped, "Cleared dataset cache");
        } else {
            debug!("Dataset cache already empty");
        }
        dropped
    }

    /// Run forever on the configured interval. The first wipe happens one
    /// interval after start.
    pub async fn run(self) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting dataset cache wiper"
        );
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.run_once();
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wms_common::DatasetProvider;

    fn provider_with_cached_dataset(dir: &std::path::Path) -> (Arc<GridFileProvider>, String) {
        let path = dir.join("d.json");
        std::fs::write(
            &path,
            r#"{"variables":[{"id":"v","grid":{"lon0":0,"lat0":0,"dlon":1,"dlat":1,"nx":1,"ny":1},"data":[[1]]}]}"#,
        )
        .unwrap();
        let location = path.to_string_lossy().into_owned();
        let provider = Arc::new(GridFileProvider::new());
        provider.variables(&location).unwrap();
        (provider, location)
    }

    #[test]
    fn test_interval_from_minutes() {
        assert_eq!(CacheWiperConfig::from_minutes(5).interval, Duration::from_secs(300));
        assert_eq!(CacheWiperConfig::from_minutes(0).interval, Duration::from_secs(60));
    }

    #[test]
    fn test_run_once() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, _) = provider_with_cached_dataset(dir.path());
        let wiper = CacheWiper::new(provider.clone(), CacheWiperConfig::from_minutes(1));
        assert_eq!(wiper.run_once(), 1);
        assert_eq!(wiper.run_once(), 0);
        assert_eq!(provider.cached_datasets(), 0);
    }

    #[tokio::test]
    async fn test_spawned_wiper_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let (provider, location) = provider_with_cached_dataset(dir.path());
        let config = CacheWiperConfig {
            interval: Duration::from_millis(40),
        };
        let handle = CacheWiper::new(provider.clone(), config).spawn();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(provider.cached_datasets(), 0);

        // Reloaded on demand, then wiped again
        provider.variables(&location).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(provider.cached_datasets(), 0);

        handle.abort();
    }
}
