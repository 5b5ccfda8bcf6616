use crate::metrics::snapshot::MetricsSnapshot;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// Running totals for one generator process. Never reset.
#[derive(Clone)]
pub struct RunAccumulator {
    total_bytes: Arc<AtomicU64>,
    requests_total: Arc<AtomicU64>,
    requests_success: Arc<AtomicU64>,
    requests_failed: Arc<AtomicU64>,
    total_fetch_time_ms: Arc<AtomicU64>,
    start_time: Arc<Instant>,
}

impl Default for RunAccumulator {
    fn default() -> Self {
        Self::started_at(Instant::now())
    }
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_at(start: Instant) -> Self {
        Self {
            total_bytes: Arc::new(AtomicU64::new(0)),
            requests_total: Arc::new(AtomicU64::new(0)),
            requests_success: Arc::new(AtomicU64::new(0)),
            requests_failed: Arc::new(AtomicU64::new(0)),
            total_fetch_time_ms: Arc::new(AtomicU64::new(0)),
            start_time: Arc::new(start),
        }
    }

    /// Records a completed fetch and returns the attempt count including it.
    pub fn record_success(&self, bytes: u64, duration: Duration) -> u64 {
        self.total_bytes.fetch_add(bytes, Ordering::SeqCst);
        self.requests_success.fetch_add(1, Ordering::SeqCst);
        self.total_fetch_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        self.requests_total.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Records a failed fetch as a zero-byte attempt.
    pub fn record_failure(&self, duration: Duration) -> u64 {
        self.requests_failed.fetch_add(1, Ordering::SeqCst);
        self.total_fetch_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        self.requests_total.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> u64 {
        self.requests_total.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.requests_total.load(Ordering::SeqCst);
        let success = self.requests_success.load(Ordering::SeqCst);
        let failed = self.requests_failed.load(Ordering::SeqCst);
        let total_time = self.total_fetch_time_ms.load(Ordering::SeqCst);
        let total_bytes = self.total_bytes.load(Ordering::SeqCst);

        let success_rate = if total_requests > 0 {
            (success as f64 / total_requests as f64) * 100.0
        } else {
            0.0
        };

        let avg_response_time_ms = if total_requests > 0 {
            total_time / total_requests
        } else {
            0
        };

        let elapsed = self.start_time.elapsed().as_secs_f64();

        MetricsSnapshot {
            requests_total: total_requests,
            requests_success: success,
            requests_failed: failed,
            total_bytes,
            success_rate,
            avg_response_time_ms,
            bytes_per_second: average_speed(total_bytes, elapsed),
            elapsed_seconds: elapsed,
        }
    }
}

pub fn average_speed(total_bytes: u64, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds > 0.0 {
        total_bytes as f64 / elapsed_seconds
    } else {
        0.0
    }
}
