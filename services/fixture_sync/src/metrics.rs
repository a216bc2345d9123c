use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_response_time_ms: f64,
    pub rate_limiter_wait_time_ms: f64,
    pub last_error: Option<String>,
    pub last_error_time: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub leagues_synced: u64,
    pub leagues_skipped: u64,
}

/// Shared counters for outbound provider calls and completed sync passes.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: Arc<Mutex<ProviderMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ProviderMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_request_start(&self) -> RequestTracker {
        RequestTracker {
            start_time: Instant::now(),
            collector: self.clone(),
        }
    }

    pub fn record_rate_limit_wait(&self, duration: Duration) {
        self.lock().rate_limiter_wait_time_ms = duration.as_secs_f64() * 1000.0;
    }

    pub fn record_error(&self, error: String) {
        let mut metrics = self.lock();
        metrics.last_error = Some(error);
        metrics.last_error_time = Some(Utc::now());
    }

    pub fn record_sync(&self, at: DateTime<Utc>, synced: u64, skipped: u64) {
        let mut metrics = self.lock();
        metrics.last_sync_at = Some(at);
        metrics.leagues_synced += synced;
        metrics.leagues_skipped += skipped;
    }

    pub fn get_metrics(&self) -> ProviderMetrics {
        self.lock().clone()
    }
}

pub struct RequestTracker {
    start_time: Instant,
    collector: MetricsCollector,
}

impl RequestTracker {
    pub fn finish(self, success: bool) {
        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut metrics = self.collector.lock();

        metrics.total_requests += 1;
        if success {
            metrics.successful_requests += 1;
        } else {
            metrics.failed_requests += 1;
        }

        // exponential moving average, first sample seeds it
        let alpha = 0.1;
        metrics.avg_response_time_ms = if metrics.total_requests == 1 {
            elapsed_ms
        } else {
            metrics.avg_response_time_ms * (1.0 - alpha) + elapsed_ms * alpha
        };
    }
}
