use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_failed: u64,
    pub total_bytes: u64,
    pub success_rate: f64,
    pub avg_response_time_ms: u64,
    pub bytes_per_second: f64,
    pub elapsed_seconds: f64,
}

impl MetricsSnapshot {
    pub fn total_kb(&self) -> f64 {
        self.total_bytes as f64 / 1024.0
    }

    pub fn kb_per_second(&self) -> f64 {
        self.bytes_per_second / 1024.0
    }
}
