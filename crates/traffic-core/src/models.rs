//! Core data models for the traffic monitor

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClassifyError, ParsePeriodError, ParseWindowError};

/// Name under which vehicle counts are recorded as metrics
pub const VEHICLE_COUNT_METRIC: &str = "vehicle_count";

/// A single recorded measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            value,
            timestamp,
        }
    }
}

/// Coarse severity band of a metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Parse the level as reported by density sensors ("Low", "Medium", "High")
    pub fn from_reported(payload: &str) -> Option<Self> {
        match payload {
            "Low" => Some(Severity::Low),
            "Medium" => Some(Severity::Medium),
            "High" => Some(Severity::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Numeric encoding used for the traffic level gauge
    pub fn rank(&self) -> i64 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds of the low and medium severity bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub low_max: f64,
    pub medium_max: f64,
}

impl ThresholdConfig {
    /// Create a validated threshold config
    pub fn new(low_max: f64, medium_max: f64) -> Result<Self, ClassifyError> {
        let config = Self {
            low_max,
            medium_max,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that both bounds are finite and strictly ordered
    pub fn validate(&self) -> Result<(), ClassifyError> {
        let ordered = self.low_max.is_finite()
            && self.medium_max.is_finite()
            && self.low_max < self.medium_max;

        if ordered {
            Ok(())
        } else {
            Err(ClassifyError::InvalidConfig {
                low_max: self.low_max,
                medium_max: self.medium_max,
            })
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            low_max: 20.0,
            medium_max: 50.0,
        }
    }
}

/// Retrospective interval over which samples are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Custom(Duration),
}

impl TimeWindow {
    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Second => Duration::seconds(1),
            TimeWindow::Minute => Duration::minutes(1),
            TimeWindow::Hour => Duration::hours(1),
            TimeWindow::Day => Duration::days(1),
            TimeWindow::Week => Duration::days(7),
            TimeWindow::Custom(d) => *d,
        }
    }

    /// Start of the window ending at `now`
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether `timestamp` lies in `[now - window, now]`
    pub fn contains(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        timestamp <= now && timestamp >= self.start(now)
    }
}

impl FromStr for TimeWindow {
    type Err = ParseWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "second" | "1s" => return Ok(TimeWindow::Second),
            "minute" | "1m" => return Ok(TimeWindow::Minute),
            "hour" | "1h" => return Ok(TimeWindow::Hour),
            "day" | "24h" | "1d" => return Ok(TimeWindow::Day),
            "week" | "7d" => return Ok(TimeWindow::Week),
            _ => {}
        }

        let invalid = || ParseWindowError(s.clone());
        let unit = s.chars().last().ok_or_else(invalid)?;
        let secs_per_unit: i64 = match unit {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            _ => return Err(invalid()),
        };

        let amount: u32 = s[..s.len() - 1].parse().map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }

        Ok(TimeWindow::Custom(Duration::seconds(
            i64::from(amount) * secs_per_unit,
        )))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Second => f.write_str("1s"),
            TimeWindow::Minute => f.write_str("1m"),
            TimeWindow::Hour => f.write_str("1h"),
            TimeWindow::Day => f.write_str("24h"),
            TimeWindow::Week => f.write_str("7d"),
            TimeWindow::Custom(d) => {
                let secs = d.num_seconds();
                if secs % 86_400 == 0 {
                    write!(f, "{}d", secs / 86_400)
                } else if secs % 3_600 == 0 {
                    write!(f, "{}h", secs / 3_600)
                } else if secs % 60 == 0 {
                    write!(f, "{}m", secs / 60)
                } else {
                    write!(f, "{}s", secs)
                }
            }
        }
    }
}

impl Serialize for TimeWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Binary priority-vehicle detection flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityState {
    pub detected: bool,
    /// Onset of the current detection
    pub since: Option<DateTime<Utc>>,
}

impl PriorityState {
    /// Apply a detection signal. Returns true when the flag flipped.
    pub fn update(&mut self, detected: bool, now: DateTime<Utc>) -> bool {
        let changed = self.detected != detected;
        self.detected = detected;
        if !detected {
            self.since = None;
        } else if changed || self.since.is_none() {
            self.since = Some(now);
        }
        changed
    }
}

/// Result of aggregating samples over a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub count: usize,
    pub latest: Option<Metric>,
}

/// Where a level observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationSource {
    /// Level reported directly by a density sensor
    Reported,
    /// Level classified from a vehicle count
    Classified,
}

/// One recorded traffic level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelObservation {
    pub intersection_id: String,
    pub level: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicles_count: Option<u64>,
    pub source: ObservationSource,
    pub timestamp: DateTime<Utc>,
}

/// A recorded priority-vehicle detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityEvent {
    pub detected: bool,
    pub timestamp: DateTime<Utc>,
}

/// Alert type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Fire,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::Fire => write!(f, "FIRE"),
        }
    }
}

/// Alert raised at an intersection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    pub intersection_id: String,
    pub alert_type: AlertType,
    pub details: String,
    pub is_active: bool,
    pub timestamp: DateTime<Utc>,
}

/// Fire sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FireReading {
    pub detected: bool,
    pub level: f64,
}

/// Live dashboard snapshot pushed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub traffic_level: Severity,
    pub vehicle_count: u64,
    pub priority_vehicles: bool,
    pub priority_label: String,
    pub priority_since: Option<DateTime<Utc>>,
    pub fire_alert: bool,
    pub smoke_level: f64,
    pub last_updated: DateTime<Utc>,
}

impl LiveSnapshot {
    /// Neutral state shown before any sensor data arrives
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            traffic_level: Severity::Low,
            vehicle_count: 0,
            priority_vehicles: false,
            priority_label: crate::classifier::priority_label(&PriorityState::default())
                .to_string(),
            priority_since: None,
            fire_alert: false,
            smoke_level: 0.0,
            last_updated: now,
        }
    }
}

/// Truncation granularity for grouped history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPeriod {
    Second,
    #[default]
    Minute,
    Hour,
}

impl HistoryPeriod {
    fn seconds(&self) -> i64 {
        match self {
            HistoryPeriod::Second => 1,
            HistoryPeriod::Minute => 60,
            HistoryPeriod::Hour => 3_600,
        }
    }

    /// Window of one period ending at the query time
    pub fn window(&self) -> TimeWindow {
        match self {
            HistoryPeriod::Second => TimeWindow::Second,
            HistoryPeriod::Minute => TimeWindow::Minute,
            HistoryPeriod::Hour => TimeWindow::Hour,
        }
    }

    /// Truncate a timestamp to the start of its bucket
    pub fn truncate(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let secs = timestamp.timestamp();
        let start = secs - secs.rem_euclid(self.seconds());
        DateTime::<Utc>::from_timestamp(start, 0).unwrap_or(timestamp)
    }
}

impl FromStr for HistoryPeriod {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "second" => Ok(HistoryPeriod::Second),
            "minute" => Ok(HistoryPeriod::Minute),
            "hour" => Ok(HistoryPeriod::Hour),
            _ => Err(ParsePeriodError),
        }
    }
}

/// Count of observations at one level within one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBucket {
    pub traffic_level: Severity,
    pub count: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_severity_from_reported_is_exact() {
        assert_eq!(Severity::from_reported("Low"), Some(Severity::Low));
        assert_eq!(Severity::from_reported("Medium"), Some(Severity::Medium));
        assert_eq!(Severity::from_reported("High"), Some(Severity::High));
        assert_eq!(Severity::from_reported("low"), None);
        assert_eq!(Severity::from_reported("Extreme"), None);
    }

    #[test]
    fn test_severity_ordering_and_serialization() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"medium\"");
        assert_eq!(Severity::High.to_string(), "high");
    }

    #[test]
    fn test_threshold_validation() {
        assert!(ThresholdConfig::new(10.0, 20.0).is_ok());
        assert!(ThresholdConfig::new(10.0, 10.0).is_err());
        assert!(ThresholdConfig::new(30.0, 20.0).is_err());
        assert!(ThresholdConfig::new(f64::NAN, 20.0).is_err());
        assert!(ThresholdConfig::default().validate().is_ok());
    }

    #[test]
    fn test_time_window_parsing() {
        assert_eq!("second".parse::<TimeWindow>().unwrap(), TimeWindow::Second);
        assert_eq!("1h".parse::<TimeWindow>().unwrap(), TimeWindow::Hour);
        assert_eq!("24h".parse::<TimeWindow>().unwrap(), TimeWindow::Day);
        assert_eq!("7d".parse::<TimeWindow>().unwrap(), TimeWindow::Week);
        assert_eq!(
            "15m".parse::<TimeWindow>().unwrap(),
            TimeWindow::Custom(Duration::minutes(15))
        );
        assert!("0m".parse::<TimeWindow>().is_err());
        assert!("10x".parse::<TimeWindow>().is_err());
        assert!("".parse::<TimeWindow>().is_err());
        assert!("-5m".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_time_window_display() {
        assert_eq!(TimeWindow::Day.to_string(), "24h");
        assert_eq!(TimeWindow::Custom(Duration::minutes(90)).to_string(), "90m");
        assert_eq!(TimeWindow::Custom(Duration::hours(48)).to_string(), "2d");
        assert_eq!(TimeWindow::Custom(Duration::seconds(45)).to_string(), "45s");
    }

    #[test]
    fn test_time_window_contains_is_closed_interval() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::Minute;

        assert!(window.contains(now, now));
        assert!(window.contains(now - Duration::seconds(60), now));
        assert!(!window.contains(now - Duration::seconds(61), now));
        assert!(!window.contains(now + Duration::seconds(1), now));
    }

    #[test]
    fn test_priority_state_keeps_onset() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let t1 = t0 + Duration::seconds(30);
        let mut state = PriorityState::default();

        assert!(state.update(true, t0));
        assert!(!state.update(true, t1));
        assert_eq!(state.since, Some(t0));

        assert!(state.update(false, t1));
        assert_eq!(state.since, None);
    }

    #[test]
    fn test_history_period_truncate() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 34, 56).unwrap();
        assert_eq!(
            HistoryPeriod::Minute.truncate(ts),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 34, 0).unwrap()
        );
        assert_eq!(
            HistoryPeriod::Hour.truncate(ts),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(HistoryPeriod::Second.truncate(ts), ts);
    }

    #[test]
    fn test_history_period_parse() {
        assert_eq!("hour".parse::<HistoryPeriod>().unwrap(), HistoryPeriod::Hour);
        let err = "day".parse::<HistoryPeriod>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid period. Valid values are: second, minute, hour."
        );
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(LiveSnapshot::initial(now)).unwrap();

        assert_eq!(json["trafficLevel"], "low");
        assert_eq!(json["vehicleCount"], 0);
        assert_eq!(json["priorityLabel"], "not-detected");
        assert_eq!(json["fireAlert"], false);
    }
}
