//! Severity banding
//!
//! Maps a non-negative value onto low/medium/high using two ordered upper
//! bounds. Each bound belongs to the lower band.

use crate::error::ClassifyError;
use crate::models::{Severity, ThresholdConfig};

/// Classify a value against the configured thresholds
///
/// # Returns
/// * `Err(InvalidConfig)` if `low_max >= medium_max`
/// * `Err(InvalidMetric)` if `value` is negative or not finite
/// * the severity band otherwise
pub fn classify(value: f64, config: &ThresholdConfig) -> Result<Severity, ClassifyError> {
    config.validate()?;

    if !value.is_finite() || value < 0.0 {
        return Err(ClassifyError::InvalidMetric(value));
    }

    let severity = if value <= config.low_max {
        Severity::Low
    } else if value <= config.medium_max {
        Severity::Medium
    } else {
        Severity::High
    };

    Ok(severity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig {
            low_max: 10.0,
            medium_max: 25.0,
        }
    }

    #[test]
    fn test_classify_bands() {
        let config = thresholds();

        assert_eq!(classify(0.0, &config).unwrap(), Severity::Low);
        assert_eq!(classify(5.0, &config).unwrap(), Severity::Low);
        assert_eq!(classify(18.0, &config).unwrap(), Severity::Medium);
        assert_eq!(classify(100.0, &config).unwrap(), Severity::High);
    }

    #[test]
    fn test_classify_boundaries_belong_to_lower_band() {
        let config = thresholds();

        assert_eq!(classify(10.0, &config).unwrap(), Severity::Low);
        assert_eq!(classify(11.0, &config).unwrap(), Severity::Medium);
        assert_eq!(classify(25.0, &config).unwrap(), Severity::Medium);
        assert_eq!(classify(26.0, &config).unwrap(), Severity::High);
    }

    #[test]
    fn test_classify_rejects_unordered_thresholds() {
        let config = ThresholdConfig {
            low_max: 10.0,
            medium_max: 10.0,
        };

        assert_eq!(
            classify(5.0, &config),
            Err(ClassifyError::InvalidConfig {
                low_max: 10.0,
                medium_max: 10.0
            })
        );
    }

    #[test]
    fn test_classify_rejects_negative_and_nan() {
        let config = thresholds();

        assert_eq!(
            classify(-1.0, &config),
            Err(ClassifyError::InvalidMetric(-1.0))
        );
        assert!(matches!(
            classify(f64::NAN, &config),
            Err(ClassifyError::InvalidMetric(_))
        ));
        assert!(classify(f64::INFINITY, &config).is_err());
    }

    #[test]
    fn test_classify_is_monotonic() {
        let config = thresholds();
        let mut previous = Severity::Low;

        for step in 0..=400 {
            let value = step as f64 * 0.25;
            let current = classify(value, &config).unwrap();
            assert!(current >= previous, "severity decreased at {}", value);
            previous = current;
        }

        assert_eq!(previous, Severity::High);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let config = thresholds();
        for value in [0.0, 10.0, 10.5, 25.0, 1e9] {
            assert_eq!(classify(value, &config), classify(value, &config));
        }
    }
}
