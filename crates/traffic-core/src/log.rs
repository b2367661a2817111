//! Bounded in-memory sample logs
//!
//! Append-only ring buffers for recorded samples:
//! - FIFO eviction once the configured capacity is reached
//! - Retention relative to the newest sample (or an explicit prune time)
//! - Window queries for aggregation and history

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use tracing::debug;

use crate::models::{Alert, LevelObservation, Metric, PriorityEvent, TimeWindow};

/// Default retention period (24 hours)
const DEFAULT_RETENTION_SECS: i64 = 24 * 60 * 60;

/// Default maximum log size (100,000 entries)
const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// Anything recorded at a point in time
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;

    /// Pinned entries are exempt from retention (capacity still applies)
    fn is_pinned(&self) -> bool {
        false
    }
}

impl Timestamped for Metric {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for LevelObservation {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for PriorityEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for Alert {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn is_pinned(&self) -> bool {
        self.is_active
    }
}

/// Configuration for a sample log
#[derive(Debug, Clone, Copy)]
pub struct LogConfig {
    /// Maximum age of a sample relative to the newest one
    pub retention: Duration,
    /// Maximum number of samples kept
    pub max_entries: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            retention: Duration::seconds(DEFAULT_RETENTION_SECS),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Append-only log of timestamped samples
///
/// Samples are expected in timestamp order; ingestion stamps them on arrival.
#[derive(Debug, Clone)]
pub struct SampleLog<T> {
    entries: VecDeque<T>,
    config: LogConfig,
}

impl<T: Timestamped> SampleLog<T> {
    pub fn new(config: LogConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.max_entries.min(10_000)),
            config,
        }
    }

    /// Append a sample, evicting the oldest entries as needed
    pub fn push(&mut self, item: T) {
        while self.entries.len() >= self.config.max_entries.max(1) {
            self.entries.pop_front();
        }

        let newest = item.timestamp();
        self.entries.push_back(item);
        self.evict_expired(newest);
    }

    /// Drop samples older than the retention period relative to `now`
    ///
    /// Returns the number of samples removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.evict_expired(now);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "Pruned sample log");
        }
        removed
    }

    fn evict_expired(&mut self, now: DateTime<Utc>) {
        let Some(cutoff) = now.checked_sub_signed(self.config.retention) else {
            return;
        };

        let expired = |e: &T| e.timestamp() < cutoff && !e.is_pinned();

        while self.entries.front().is_some_and(|e| expired(e)) {
            self.entries.pop_front();
        }

        // a pinned entry at the front can shield expired ones behind it
        if self.entries.front().is_some_and(|e| e.timestamp() < cutoff) {
            self.entries.retain(|e| !expired(e));
        }
    }

    /// Samples recorded in `[now - window, now]`
    pub fn within(&self, window: TimeWindow, now: DateTime<Utc>) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .filter(move |e| window.contains(e.timestamp(), now))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Mutable access for status fields; timestamps must not be changed
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.iter_mut()
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.max_entries
    }

    pub fn stats(&self) -> LogStats {
        LogStats {
            entries: self.entries.len(),
            capacity: self.config.max_entries,
            oldest: self.entries.front().map(Timestamped::timestamp),
            newest: self.entries.back().map(Timestamped::timestamp),
            retention_seconds: self.config.retention.num_seconds(),
        }
    }
}

impl<T: Timestamped + Clone> SampleLog<T> {
    /// Copy the log contents in insertion order
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

impl<T: Timestamped> Default for SampleLog<T> {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

/// Log statistics
#[derive(Debug, Clone, PartialEq)]
pub struct LogStats {
    pub entries: usize,
    pub capacity: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub retention_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn metric_at(secs: i64, value: f64) -> Metric {
        Metric::new("vehicle_count", value, base() + Duration::seconds(secs))
    }

    fn small_log(max_entries: usize, retention_secs: i64) -> SampleLog<Metric> {
        SampleLog::new(LogConfig {
            retention: Duration::seconds(retention_secs),
            max_entries,
        })
    }

    #[test]
    fn test_log_push_and_iter() {
        let mut log = small_log(10, 3600);
        log.push(metric_at(0, 1.0));
        log.push(metric_at(1, 2.0));

        assert_eq!(log.len(), 2);
        let values: Vec<f64> = log.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![1.0, 2.0]);
        assert_eq!(log.latest().unwrap().value, 2.0);
    }

    #[test]
    fn test_log_capacity_limit() {
        let mut log = small_log(3, 3600);
        for i in 0..5 {
            log.push(metric_at(i, i as f64));
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().next().unwrap().value, 2.0);
    }

    #[test]
    fn test_log_retention_on_push() {
        let mut log = small_log(100, 60);
        log.push(metric_at(0, 1.0));
        log.push(metric_at(30, 2.0));
        log.push(metric_at(90, 3.0));

        let values: Vec<f64> = log.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[test]
    fn test_log_prune() {
        let mut log = small_log(100, 60);
        log.push(metric_at(0, 1.0));
        log.push(metric_at(10, 2.0));

        assert_eq!(log.prune(base() + Duration::seconds(65)), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.prune(base() + Duration::seconds(65)), 0);
    }

    #[test]
    fn test_log_within_window() {
        let mut log = small_log(100, 3600);
        for i in 0..10 {
            log.push(metric_at(i * 10, i as f64));
        }

        let now = base() + Duration::seconds(90);
        let recent: Vec<f64> = log
            .within(TimeWindow::Custom(Duration::seconds(30)), now)
            .map(|m| m.value)
            .collect();
        assert_eq!(recent, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_log_stats() {
        let mut log = small_log(50, 120);
        log.push(metric_at(0, 1.0));
        log.push(metric_at(5, 1.0));

        let stats = log.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.capacity, 50);
        assert_eq!(stats.oldest, Some(base()));
        assert_eq!(stats.newest, Some(base() + Duration::seconds(5)));
        assert_eq!(stats.retention_seconds, 120);
    }

    fn alert_at(id: u64, secs: i64, is_active: bool) -> Alert {
        Alert {
            id,
            intersection_id: "intersection-main".to_string(),
            alert_type: crate::models::AlertType::Fire,
            details: "Smoke level: 300".to_string(),
            is_active,
            timestamp: base() + Duration::seconds(secs),
        }
    }

    #[test]
    fn test_active_alerts_survive_retention() {
        let mut log: SampleLog<Alert> = SampleLog::new(LogConfig {
            retention: Duration::seconds(60),
            max_entries: 10,
        });
        log.push(alert_at(1, 0, true));
        log.push(alert_at(2, 10, false));
        log.push(alert_at(3, 500, false));

        // the cleared alert behind the active one is still evicted
        let ids: Vec<u64> = log.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);

        for alert in log.iter_mut() {
            alert.is_active = false;
        }
        assert_eq!(log.prune(base() + Duration::seconds(500)), 1);
        assert_eq!(log.latest().unwrap().id, 3);
    }

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.retention, Duration::hours(24));
        assert_eq!(config.max_entries, 100_000);
    }
}
