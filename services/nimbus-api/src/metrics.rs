//! Prometheus metric names and recording helpers.

use metrics::{counter, histogram};
use std::time::Instant;

pub const CACHE_HITS: &str = "satellite_cache_hits_total";
pub const CACHE_MISSES: &str = "satellite_cache_misses_total";
pub const RENDER_DURATION_MS: &str = "satellite_render_duration_ms";
pub const RENDER_ERRORS: &str = "satellite_render_errors_total";
pub const SWEEP_DELETED: &str = "satellite_sweep_deleted_total";
pub const SWEEP_FAILED: &str = "satellite_sweep_failed_total";
pub const UPSTREAM_REQUESTS: &str = "upstream_requests_total";
pub const UPSTREAM_ERRORS: &str = "upstream_errors_total";

pub fn record_cache_hit() {
    counter!(CACHE_HITS).increment(1);
}

pub fn record_cache_miss() {
    counter!(CACHE_MISSES).increment(1);
}

pub fn record_render(duration_ms: f64) {
    histogram!(RENDER_DURATION_MS).record(duration_ms);
}

pub fn record_render_error(kind: &'static str) {
    counter!(RENDER_ERRORS, "kind" => kind).increment(1);
}

pub fn record_sweep(deleted: usize, failed: usize) {
    counter!(SWEEP_DELETED).increment(deleted as u64);
    if failed > 0 {
        counter!(SWEEP_FAILED).increment(failed as u64);
    }
}

/// Count one call to an external service.
pub fn record_upstream(service: &'static str, ok: bool) {
    counter!(UPSTREAM_REQUESTS, "service" => service).increment(1);
    if !ok {
        counter!(UPSTREAM_ERRORS, "service" => service).increment(1);
    }
}

/// Simple timer for measuring durations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
