//! Windowed aggregation of recorded samples

use chrono::{DateTime, Utc};

use crate::error::ClassifyError;
use crate::models::{AggregateResult, Metric, TimeWindow};

/// Count the samples recorded in `[now - window, now]`
///
/// `latest` is the qualifying sample with the greatest timestamp; on ties
/// the one appearing later in `samples` wins.
///
/// # Returns
/// * `Err(EmptyWindow)` if no sample qualifies
pub fn aggregate(
    samples: &[Metric],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Result<AggregateResult, ClassifyError> {
    let mut count = 0;
    let mut latest: Option<&Metric> = None;

    for sample in samples
        .iter()
        .filter(|s| window.contains(s.timestamp, now))
    {
        count += 1;
        if latest.map_or(true, |l| sample.timestamp >= l.timestamp) {
            latest = Some(sample);
        }
    }

    if count == 0 {
        return Err(ClassifyError::EmptyWindow);
    }

    Ok(AggregateResult {
        count,
        latest: latest.cloned(),
    })
}
