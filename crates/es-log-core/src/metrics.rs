//! Metrics for the ES log shipper
//!
//! Emits through the `metrics` facade; whatever recorder the host process
//! installs (Prometheus exporter, statsd, nothing) receives these.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metric names as constants for consistency
pub mod names {
    pub const SHIPPER_EVENTS_ENQUEUED_TOTAL: &str = "es_log_shipper_events_enqueued_total";
    pub const SHIPPER_EVENTS_DROPPED_TOTAL: &str = "es_log_shipper_events_dropped_total";
    pub const SHIPPER_BULK_REQUESTS_TOTAL: &str = "es_log_shipper_bulk_requests_total";
    pub const SHIPPER_DOCS_SHIPPED_TOTAL: &str = "es_log_shipper_docs_shipped_total";
    pub const SHIPPER_DOCS_FAILED_TOTAL: &str = "es_log_shipper_docs_failed_total";
    pub const SHIPPER_BULK_LATENCY_SECONDS: &str = "es_log_shipper_bulk_latency_seconds";
    pub const SHIPPER_BUFFER_SIZE: &str = "es_log_shipper_buffer_size";
}

/// Labels for metrics
pub mod labels {
    pub const COMPONENT: &str = "component";
    pub const INDEX: &str = "index";
    pub const REASON: &str = "reason";
}

/// Shipper metrics handle
#[derive(Clone)]
pub struct ShipperMetrics {
    component: String,
}

impl ShipperMetrics {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Record an event accepted onto the hand-off queue
    pub fn record_enqueued(&self) {
        counter!(
            names::SHIPPER_EVENTS_ENQUEUED_TOTAL,
            labels::COMPONENT => self.component.clone(),
        )
        .increment(1);
    }

    /// Record an event discarded before the queue (disabled state, level filter)
    pub fn record_dropped(&self, reason: &'static str) {
        counter!(
            names::SHIPPER_EVENTS_DROPPED_TOTAL,
            labels::COMPONENT => self.component.clone(),
            labels::REASON => reason,
        )
        .increment(1);
    }

    /// Record one bulk request issued
    pub fn record_bulk_request(&self) {
        counter!(
            names::SHIPPER_BULK_REQUESTS_TOTAL,
            labels::COMPONENT => self.component.clone(),
        )
        .increment(1);
    }

    /// Record documents accepted by the backend
    pub fn record_docs_shipped(&self, count: u64, index: &str) {
        counter!(
            names::SHIPPER_DOCS_SHIPPED_TOTAL,
            labels::COMPONENT => self.component.clone(),
            labels::INDEX => index.to_string(),
        )
        .increment(count);
    }

    /// Record documents lost to rejection or transmission failure
    pub fn record_docs_failed(&self, count: u64, reason: &'static str) {
        counter!(
            names::SHIPPER_DOCS_FAILED_TOTAL,
            labels::COMPONENT => self.component.clone(),
            labels::REASON => reason,
        )
        .increment(count);
    }

    /// Record bulk write latency
    pub fn record_bulk_latency(&self, duration: Duration) {
        histogram!(
            names::SHIPPER_BULK_LATENCY_SECONDS,
            labels::COMPONENT => self.component.clone(),
        )
        .record(duration.as_secs_f64());
    }

    /// Track the current buffer depth
    pub fn set_buffer_size(&self, size: usize) {
        gauge!(
            names::SHIPPER_BUFFER_SIZE,
            labels::COMPONENT => self.component.clone(),
        )
        .set(size as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_a_recorder_is_a_noop() {
        let metrics = ShipperMetrics::new("test");
        metrics.record_enqueued();
        metrics.record_dropped("disabled");
        metrics.record_docs_shipped(3, "logs");
        metrics.record_bulk_latency(Duration::from_millis(5));
        metrics.set_buffer_size(7);
    }
}
