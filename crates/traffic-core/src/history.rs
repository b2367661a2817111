//! Grouped traffic level history
//!
//! Counts level observations per `(level, bucket)` over the last period,
//! where each bucket is the observation time truncated to the period.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::models::{HistoryBucket, HistoryPeriod, LevelObservation, Severity};

/// Group observations from the last `period` into per-level buckets
///
/// Observations qualify when `now - period < timestamp <= now`. Buckets are
/// ordered by start time, then by level.
pub fn history<'a, I>(observations: I, period: HistoryPeriod, now: DateTime<Utc>) -> Vec<HistoryBucket>
where
    I: IntoIterator<Item = &'a LevelObservation>,
{
    let start = period.window().start(now);
    let mut counts: BTreeMap<(DateTime<Utc>, Severity), u64> = BTreeMap::new();

    for observation in observations
        .into_iter()
        .filter(|o| o.timestamp > start && o.timestamp <= now)
    {
        let bucket = period.truncate(observation.timestamp);
        *counts.entry((bucket, observation.level)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((timestamp, traffic_level), count)| HistoryBucket {
            traffic_level,
            count,
            timestamp,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObservationSource;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    fn observation(secs_ago: i64, level: Severity) -> LevelObservation {
        LevelObservation {
            intersection_id: "intersection-main".to_string(),
            level,
            vehicles_count: None,
            source: ObservationSource::Reported,
            timestamp: now() - Duration::seconds(secs_ago),
        }
    }

    #[test]
    fn test_history_empty() {
        let empty: Vec<LevelObservation> = Vec::new();
        assert!(history(&empty, HistoryPeriod::Minute, now()).is_empty());
    }

    #[test]
    fn test_history_groups_by_level_and_bucket() {
        let observations = vec![
            observation(50, Severity::Low),
            observation(40, Severity::High),
            observation(35, Severity::Low),
            observation(10, Severity::Low),
        ];

        let buckets = history(&observations, HistoryPeriod::Minute, now());

        // all four fall in the 12:29 bucket
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].traffic_level, Severity::Low);
        assert_eq!(buckets[0].count, 3);
        assert_eq!(buckets[1].traffic_level, Severity::High);
        assert_eq!(buckets[1].count, 1);
        assert_eq!(
            buckets[0].timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 29, 0).unwrap()
        );
    }

    #[test]
    fn test_history_excludes_older_than_period() {
        let observations = vec![
            observation(3 * 3600, Severity::High),
            observation(120, Severity::Medium),
            observation(5, Severity::Low),
        ];

        let buckets = history(&observations, HistoryPeriod::Minute, now());
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].traffic_level, Severity::Low);

        let buckets = history(&observations, HistoryPeriod::Hour, now());
        let total: u64 = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_history_lower_bound_is_exclusive() {
        let observations = vec![
            observation(60, Severity::High),
            observation(59, Severity::Low),
            observation(-1, Severity::Medium),
        ];

        let buckets = history(&observations, HistoryPeriod::Minute, now());
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].traffic_level, Severity::Low);
        assert_eq!(buckets[0].count, 1);
    }

    #[test]
    fn test_history_orders_buckets_by_time() {
        let observations = vec![
            observation(1, Severity::High),
            observation(3000, Severity::Low),
            observation(1500, Severity::Medium),
        ];

        let buckets = history(&observations, HistoryPeriod::Hour, now());
        let timestamps: Vec<_> = buckets.iter().map(|b| b.timestamp).collect();
        let mut sorted = timestamps.clone();
        sorted.sort();
        assert_eq!(timestamps, sorted);
        assert_eq!(buckets.first().unwrap().traffic_level, Severity::Low);
    }
}
