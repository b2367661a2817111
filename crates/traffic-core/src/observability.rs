//! Observability infrastructure for the traffic monitor
//!
//! Provides:
//! - Prometheus metrics (ingested messages, live values, alert counters, apply latency)
//! - Structured JSON logging of dashboard events with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, Histogram, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::models::Severity;

/// Histogram buckets for event apply latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    messages_received: IntCounterVec,
    invalid_payloads: IntCounterVec,
    apply_latency_seconds: Histogram,
    vehicle_count: IntGauge,
    traffic_level: IntGauge,
    priority_detected: IntGauge,
    priority_detections: IntCounter,
    fire_alerts: IntCounter,
    subscribers: IntGauge,
    log_entries: IntGaugeVec,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            messages_received: register_int_counter_vec!(
                "traffic_monitor_messages_received_total",
                "Sensor messages received, by topic",
                &["topic"]
            )
            .expect("Failed to register messages_received_total"),

            invalid_payloads: register_int_counter_vec!(
                "traffic_monitor_invalid_payloads_total",
                "Sensor messages rejected, by topic",
                &["topic"]
            )
            .expect("Failed to register invalid_payloads_total"),

            apply_latency_seconds: register_histogram!(
                "traffic_monitor_apply_latency_seconds",
                "Time spent applying a sensor event to dashboard state",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register apply_latency_seconds"),

            vehicle_count: register_int_gauge!(
                "traffic_monitor_vehicle_count",
                "Most recent vehicle count"
            )
            .expect("Failed to register vehicle_count"),

            traffic_level: register_int_gauge!(
                "traffic_monitor_traffic_level",
                "Current traffic level (0 = low, 1 = medium, 2 = high)"
            )
            .expect("Failed to register traffic_level"),

            priority_detected: register_int_gauge!(
                "traffic_monitor_priority_detected",
                "Whether a priority vehicle is currently detected"
            )
            .expect("Failed to register priority_detected"),

            priority_detections: register_int_counter!(
                "traffic_monitor_priority_detections_total",
                "Priority vehicle detection signals received"
            )
            .expect("Failed to register priority_detections_total"),

            fire_alerts: register_int_counter!(
                "traffic_monitor_fire_alerts_total",
                "Fire alerts raised"
            )
            .expect("Failed to register fire_alerts_total"),

            subscribers: register_int_gauge!(
                "traffic_monitor_subscribers",
                "Clients subscribed to live updates"
            )
            .expect("Failed to register subscribers"),

            log_entries: register_int_gauge_vec!(
                "traffic_monitor_log_entries",
                "Entries held in each in-memory log",
                &["log"]
            )
            .expect("Failed to register log_entries"),
        }
    }
}

/// Handle to the process-wide monitor metrics
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a metrics handle, registering collectors on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    pub fn inc_messages_received(&self, topic: &str) {
        self.inner()
            .messages_received
            .with_label_values(&[topic])
            .inc();
    }

    pub fn inc_invalid_payloads(&self, topic: &str) {
        self.inner()
            .invalid_payloads
            .with_label_values(&[topic])
            .inc();
    }

    pub fn observe_apply_latency(&self, duration_secs: f64) {
        self.inner().apply_latency_seconds.observe(duration_secs);
    }

    pub fn set_vehicle_count(&self, count: u64) {
        self.inner()
            .vehicle_count
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn set_traffic_level(&self, level: Severity) {
        self.inner().traffic_level.set(level.rank());
    }

    pub fn set_priority_detected(&self, detected: bool) {
        self.inner().priority_detected.set(i64::from(detected));
    }

    pub fn inc_priority_detections(&self) {
        self.inner().priority_detections.inc();
    }

    pub fn inc_fire_alerts(&self) {
        self.inner().fire_alerts.inc();
    }

    pub fn set_subscribers(&self, count: usize) {
        self.inner()
            .subscribers
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn set_log_entries(&self, log: &str, entries: usize) {
        self.inner()
            .log_entries
            .with_label_values(&[log])
            .set(i64::try_from(entries).unwrap_or(i64::MAX));
    }
}

/// Structured logger for dashboard events
///
/// Emits one JSON log line per significant event, tagged with the
/// intersection the service monitors.
#[derive(Clone)]
pub struct StructuredLogger {
    intersection_id: String,
}

impl StructuredLogger {
    pub fn new(intersection_id: impl Into<String>) -> Self {
        Self {
            intersection_id: intersection_id.into(),
        }
    }

    pub fn intersection_id(&self) -> &str {
        &self.intersection_id
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "service_started",
            intersection = %self.intersection_id,
            version = %version,
            port = port,
            "Traffic monitor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            intersection = %self.intersection_id,
            reason = %reason,
            "Traffic monitor shutting down"
        );
    }

    pub fn log_traffic_update(&self, level: Severity, vehicle_count: Option<u64>) {
        info!(
            event = "traffic_update",
            intersection = %self.intersection_id,
            traffic_level = %level,
            vehicle_count = ?vehicle_count,
            "Traffic level updated"
        );
    }

    pub fn log_priority_change(&self, detected: bool) {
        if detected {
            warn!(
                event = "priority_changed",
                intersection = %self.intersection_id,
                detected = true,
                "Priority vehicle detected"
            );
        } else {
            info!(
                event = "priority_changed",
                intersection = %self.intersection_id,
                detected = false,
                "Priority vehicle cleared"
            );
        }
    }

    pub fn log_fire_alert(&self, alert_id: u64, smoke_level: f64) {
        warn!(
            event = "fire_alert",
            intersection = %self.intersection_id,
            alert_id = alert_id,
            smoke_level = smoke_level,
            "Fire detected"
        );
    }

    pub fn log_invalid_payload(&self, topic: &str, payload: &str, error: &str) {
        warn!(
            event = "invalid_payload",
            intersection = %self.intersection_id,
            topic = %topic,
            payload = %payload,
            error = %error,
            "Rejected sensor message"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_metrics_observations() {
        // Collectors live in the global registry, so every handle shares them
        let metrics = MonitorMetrics::new();
        let other = metrics.clone();

        metrics.inc_messages_received("traffic/density");
        other.inc_invalid_payloads("traffic/fire");
        metrics.observe_apply_latency(0.0001);
        metrics.set_vehicle_count(12);
        metrics.set_traffic_level(Severity::High);
        metrics.set_priority_detected(true);
        metrics.inc_priority_detections();
        metrics.inc_fire_alerts();
        metrics.set_subscribers(2);
        metrics.set_log_entries("metrics", 10);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "traffic_monitor_traffic_level"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("intersection-main");
        assert_eq!(logger.intersection_id(), "intersection-main");
    }
}
