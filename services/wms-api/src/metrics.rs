//! Application metrics collection and reporting.

use metrics::{counter, histogram};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use wms_common::WmsError;

/// Metrics collector for the WMS API.
#[derive(Debug)]
pub struct MetricsCollector {
    pub requests: AtomicU64,
    /// Requests answered with a ServiceExceptionReport.
    pub exceptions: AtomicU64,
    /// Exceptions caused by the server rather than the client.
    pub internal_errors: AtomicU64,
    request_times: Mutex<TimingStats>,
    start_time: Instant,
}

#[derive(Debug, Default)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
    last_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        self.last_us = duration_us;
        if self.min_us == 0 || duration_us < self.min_us {
            self.min_us = duration_us;
        }
        if duration_us > self.max_us {
            self.max_us = duration_us;
        }
    }

    fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_us as f64 / self.count as f64) / 1000.0
        }
    }
}

/// Point-in-time view served by `/api/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests: u64,
    pub exceptions: u64,
    pub internal_errors: u64,
    pub avg_request_ms: f64,
    pub min_request_ms: f64,
    pub max_request_ms: f64,
    pub last_request_ms: f64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            exceptions: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
            request_times: Mutex::new(TimingStats::default()),
            start_time: Instant::now(),
        }
    }

    /// Record one handled request; `error` is set when it was answered
    /// with an exception report.
    pub fn record_request(&self, request: &str, duration: Duration, error: Option<&WmsError>) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        counter!("wms_requests_total", "request" => request.to_string()).increment(1);
        histogram!("wms_request_duration_seconds").record(duration.as_secs_f64());

        if let Some(err) = error {
            self.exceptions.fetch_add(1, Ordering::Relaxed);
            let label = err.code().map_or("none", |c| c.as_str());
            counter!("wms_exceptions_total", "code" => label).increment(1);
            if !err.is_client_error() {
                self.internal_errors.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Ok(mut times) = self.request_times.lock() {
            times.record(duration.as_micros() as u64);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (avg, min, max, last) = match self.request_times.lock() {
            Ok(t) => (
                t.avg_ms(),
                t.min_us as f64 / 1000.0,
                t.max_us as f64 / 1000.0,
                t.last_us as f64 / 1000.0,
            ),
            Err(_) => (0.0, 0.0, 0.0, 0.0),
        };
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            requests: self.requests.load(Ordering::Relaxed),
            exceptions: self.exceptions.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
            avg_request_ms: avg,
            min_request_ms: min,
            max_request_ms: max,
            last_request_ms: last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_stats() {
        let mut stats = TimingStats::default();
        stats.record(2000);
        stats.record(4000);
        assert_eq!(stats.avg_ms(), 3.0);
        assert_eq!(stats.min_us, 2000);
        assert_eq!(stats.max_us, 4000);
        assert_eq!(stats.last_us, 4000);
    }

    #[test]
    fn test_snapshot_counts() {
        let metrics = MetricsCollector::new();
        metrics.record_request("GetMap", Duration::from_millis(5), None);
        metrics.record_request(
            "GetMap",
            Duration::from_millis(1),
            Some(&WmsError::InvalidCrs("EPSG:1".into())),
        );
        metrics.record_request(
            "GetMap",
            Duration::from_millis(3),
            Some(&WmsError::Internal("disk".into())),
        );

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests, 3);
        assert_eq!(snapshot.exceptions, 2);
        assert_eq!(snapshot.internal_errors, 1);
        assert_eq!(snapshot.min_request_ms, 1.0);
        assert_eq!(snapshot.max_request_ms, 5.0);
        assert_eq!(snapshot.last_request_ms, 3.0);
    }
}
