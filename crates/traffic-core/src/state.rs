//! Shared dashboard state
//!
//! Holds the live snapshot, the priority flag and the in-memory logs behind
//! a single lock. Each sensor event is applied under the write lock, so
//! metric logs stay append-only, the priority flag is last-write-wins and
//! readers always see a consistent snapshot. Every accepted event is
//! broadcast to live subscribers.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::classifier::{self, priority_label};
use crate::error::{ClassifyError, IngestError};
use crate::health::{Component, HealthRegistry};
use crate::history;
use crate::ingest::{parse_message, IngestEvent, TopicMessage};
use crate::log::{LogConfig, SampleLog};
use crate::models::{
    AggregateResult, Alert, AlertType, FireReading, HistoryBucket, HistoryPeriod,
    LevelObservation, LiveSnapshot, Metric, ObservationSource, PriorityEvent, PriorityState,
    Severity, ThresholdConfig, TimeWindow, VEHICLE_COUNT_METRIC,
};
use crate::observability::{MonitorMetrics, StructuredLogger};

/// Default capacity of the live update channel
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Configuration for the dashboard state
#[derive(Debug, Clone)]
pub struct StateConfig {
    pub intersection_id: String,
    pub thresholds: ThresholdConfig,
    pub log: LogConfig,
    pub broadcast_capacity: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            intersection_id: "intersection-main".to_string(),
            thresholds: ThresholdConfig::default(),
            log: LogConfig::default(),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

struct Inner {
    snapshot: LiveSnapshot,
    priority: PriorityState,
    metrics: SampleLog<Metric>,
    observations: SampleLog<LevelObservation>,
    priority_events: SampleLog<PriorityEvent>,
    alerts: SampleLog<Alert>,
    next_alert_id: u64,
}

/// Cloneable handle to the dashboard state
#[derive(Clone)]
pub struct DashboardState {
    inner: Arc<RwLock<Inner>>,
    thresholds: ThresholdConfig,
    updates: broadcast::Sender<LiveSnapshot>,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
}

impl DashboardState {
    /// Create the state, rejecting invalid thresholds
    pub fn new(config: StateConfig) -> Result<Self, ClassifyError> {
        config.thresholds.validate()?;

        let (updates, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let inner = Inner {
            snapshot: LiveSnapshot::initial(Utc::now()),
            priority: PriorityState::default(),
            metrics: SampleLog::new(config.log),
            observations: SampleLog::new(config.log),
            priority_events: SampleLog::new(config.log),
            alerts: SampleLog::new(config.log),
            next_alert_id: 1,
        };

        Ok(Self {
            inner: Arc::new(RwLock::new(inner)),
            thresholds: config.thresholds,
            updates,
            metrics: MonitorMetrics::new(),
            logger: StructuredLogger::new(config.intersection_id),
        })
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.thresholds
    }

    pub fn intersection_id(&self) -> &str {
        self.logger.intersection_id()
    }

    /// Subscribe to snapshots published after each accepted event
    pub fn subscribe(&self) -> broadcast::Receiver<LiveSnapshot> {
        let receiver = self.updates.subscribe();
        self.metrics.set_subscribers(self.updates.receiver_count());
        receiver
    }

    /// Parse and apply a raw sensor message
    pub async fn ingest(
        &self,
        message: &TopicMessage,
        now: DateTime<Utc>,
    ) -> Result<LiveSnapshot, IngestError> {
        self.metrics.inc_messages_received(&message.topic);

        let result = match parse_message(message) {
            Ok(event) => self.apply(event, now).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            self.metrics.inc_invalid_payloads(&message.topic);
            self.logger
                .log_invalid_payload(&message.topic, &message.payload, &e.to_string());
        }

        result
    }

    /// Apply a typed event and publish the resulting snapshot
    pub async fn apply(
        &self,
        event: IngestEvent,
        now: DateTime<Utc>,
    ) -> Result<LiveSnapshot, IngestError> {
        let start = Instant::now();
        let mut inner = self.inner.write().await;

        match event {
            IngestEvent::Density(level) => {
                self.record_level(&mut inner, level, None, ObservationSource::Reported, now);
            }
            IngestEvent::VehicleCount(count) => {
                let level = classifier::classify(count as f64, &self.thresholds)?;
                let count = count.unsigned_abs();

                inner.snapshot.vehicle_count = count;
                inner
                    .metrics
                    .push(Metric::new(VEHICLE_COUNT_METRIC, count as f64, now));
                self.metrics.set_vehicle_count(count);
                self.record_level(
                    &mut inner,
                    level,
                    Some(count),
                    ObservationSource::Classified,
                    now,
                );
            }
            IngestEvent::Priority(detected) => {
                self.record_priority(&mut inner, detected, now);
            }
            IngestEvent::Fire(reading) => {
                self.record_fire(&mut inner, reading, now);
            }
        }

        inner.snapshot.last_updated = now;
        let snapshot = inner.snapshot.clone();
        self.publish_gauges(&inner);

        // Sent under the lock so subscribers see updates in apply order
        if self.updates.send(snapshot.clone()).is_err() {
            debug!("No live subscribers for snapshot update");
        }
        drop(inner);

        self.metrics
            .observe_apply_latency(start.elapsed().as_secs_f64());
        Ok(snapshot)
    }

    fn record_level(
        &self,
        inner: &mut Inner,
        level: Severity,
        vehicles_count: Option<u64>,
        source: ObservationSource,
        now: DateTime<Utc>,
    ) {
        inner.snapshot.traffic_level = level;
        inner.observations.push(LevelObservation {
            intersection_id: self.intersection_id().to_string(),
            level,
            vehicles_count,
            source,
            timestamp: now,
        });

        self.metrics.set_traffic_level(level);
        self.logger.log_traffic_update(level, vehicles_count);
    }

    fn record_priority(&self, inner: &mut Inner, detected: bool, now: DateTime<Utc>) {
        let changed = inner.priority.update(detected, now);

        inner.snapshot.priority_vehicles = inner.priority.detected;
        inner.snapshot.priority_since = inner.priority.since;
        inner.snapshot.priority_label = priority_label(&inner.priority).to_string();

        if detected {
            inner.priority_events.push(PriorityEvent {
                detected,
                timestamp: now,
            });
            self.metrics.inc_priority_detections();
        }
        if changed {
            self.metrics.set_priority_detected(detected);
            self.logger.log_priority_change(detected);
        }
    }

    fn record_fire(&self, inner: &mut Inner, reading: FireReading, now: DateTime<Utc>) {
        inner.snapshot.fire_alert = reading.detected;
        inner.snapshot.smoke_level = reading.level;

        if reading.detected {
            let id = inner.next_alert_id;
            inner.next_alert_id += 1;
            inner.alerts.push(Alert {
                id,
                intersection_id: self.intersection_id().to_string(),
                alert_type: AlertType::Fire,
                details: format!("Smoke level: {}", reading.level),
                is_active: true,
                timestamp: now,
            });

            self.metrics.inc_fire_alerts();
            self.logger.log_fire_alert(id, reading.level);
        } else {
            for alert in inner
                .alerts
                .iter_mut()
                .filter(|a| a.alert_type == AlertType::Fire && a.is_active)
            {
                alert.is_active = false;
            }
        }
    }

    /// Refresh log size and subscriber gauges
    ///
    /// Disconnected subscribers are only noticed here, since dropping a
    /// receiver does not notify the sender.
    fn publish_gauges(&self, inner: &Inner) {
        self.metrics.set_subscribers(self.updates.receiver_count());
        self.metrics.set_log_entries("metrics", inner.metrics.len());
        self.metrics
            .set_log_entries("observations", inner.observations.len());
        self.metrics
            .set_log_entries("priority_events", inner.priority_events.len());
        self.metrics.set_log_entries("alerts", inner.alerts.len());
    }

    pub async fn snapshot(&self) -> LiveSnapshot {
        self.inner.read().await.snapshot.clone()
    }

    pub async fn priority(&self) -> PriorityState {
        self.inner.read().await.priority
    }

    /// Aggregate recorded vehicle counts over a window ending at `now`
    pub async fn aggregate(
        &self,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<AggregateResult, ClassifyError> {
        let samples: Vec<Metric> = {
            let inner = self.inner.read().await;
            inner.metrics.within(window, now).cloned().collect()
        };
        classifier::aggregate(&samples, window, now)
    }

    /// Grouped level history for the last `period`
    pub async fn history(&self, period: HistoryPeriod, now: DateTime<Utc>) -> Vec<HistoryBucket> {
        let inner = self.inner.read().await;
        history::history(inner.observations.iter(), period, now)
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.inner.read().await.alerts.to_vec()
    }

    pub async fn priority_events(&self) -> Vec<PriorityEvent> {
        self.inner.read().await.priority_events.to_vec()
    }

    /// Logs that have reached capacity and now drop entries before they expire
    pub async fn saturated_logs(&self) -> Vec<&'static str> {
        let inner = self.inner.read().await;
        [
            ("metrics", inner.metrics.len() >= inner.metrics.capacity()),
            ("observations", inner.observations.len() >= inner.observations.capacity()),
            (
                "priority_events",
                inner.priority_events.len() >= inner.priority_events.capacity(),
            ),
            ("alerts", inner.alerts.len() >= inner.alerts.capacity()),
        ]
        .into_iter()
        .filter_map(|(name, full)| full.then_some(name))
        .collect()
    }

    /// Apply retention to every log. Returns the number of entries removed.
    pub async fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.inner.write().await;
        let removed = inner.metrics.prune(now)
            + inner.observations.prune(now)
            + inner.priority_events.prune(now)
            + inner.alerts.prune(now);
        self.publish_gauges(&inner);
        removed
    }
}

/// Periodically prune the dashboard logs until shutdown
///
/// Each pass reports the `state` component: degraded while any log is at
/// capacity, healthy otherwise.
pub async fn run_maintenance(
    state: DashboardState,
    health: HealthRegistry,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Starting log maintenance loop"
    );

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = state.prune(Utc::now()).await;
                if removed > 0 {
                    debug!(removed, "Maintenance pass pruned expired entries");
                }

                let saturated = state.saturated_logs().await;
                if saturated.is_empty() {
                    health.set_healthy(Component::State).await;
                } else {
                    tracing::warn!(logs = ?saturated, "Sample logs at capacity");
                    health
                        .set_degraded(
                            Component::State,
                            format!("logs at capacity: {}", saturated.join(", ")),
                        )
                        .await;
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Shutting down log maintenance loop");
                break;
            }
        }
    }
}
