//! Offline classification against a threshold configuration

use anyhow::Result;
use serde::Serialize;
use traffic_core::{classify, Severity, ThresholdConfig};

use crate::output::{color_severity, format_value, print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct Classification {
    value: f64,
    severity: Severity,
    thresholds: ThresholdConfig,
}

/// Classify a single value and print its band
pub fn classify_value(value: f64, thresholds: ThresholdConfig, format: OutputFormat) -> Result<()> {
    let severity = classify(value, &thresholds)?;

    match format {
        OutputFormat::Json => print_json(&Classification {
            value,
            severity,
            thresholds,
        })?,
        OutputFormat::Table => {
            println!(
                "{} -> {}  (low <= {}, medium <= {})",
                format_value(value),
                color_severity(severity),
                format_value(thresholds.low_max),
                format_value(thresholds.medium_max)
            );
        }
    }

    Ok(())
}
