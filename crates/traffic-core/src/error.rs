//! Error types for classification and ingestion

use thiserror::Error;

/// Errors produced by the status classifier
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifyError {
    /// Threshold bounds are not strictly ordered or not finite
    #[error("invalid threshold config: low_max ({low_max}) must be below medium_max ({medium_max})")]
    InvalidConfig { low_max: f64, medium_max: f64 },

    /// Metric value is negative or not a number
    #[error("invalid metric value: {0}")]
    InvalidMetric(f64),

    /// No samples fall inside the requested window
    #[error("no samples in window")]
    EmptyWindow,
}

impl ClassifyError {
    /// Returns true for the "no data" condition callers render as a neutral state
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ClassifyError::EmptyWindow)
    }
}

/// Unrecognised time window string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time window '{0}': expected second, minute, hour, 24h, 7d or <n><s|m|h|d>")]
pub struct ParseWindowError(pub String);

/// Unrecognised history period string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid period. Valid values are: second, minute, hour.")]
pub struct ParsePeriodError;

/// Errors produced while turning a sensor message into an event
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("invalid traffic density payload: {0}")]
    InvalidDensity(String),

    #[error("invalid vehicle count payload: {0}")]
    InvalidCount(String),

    #[error("invalid fire payload: {0}")]
    InvalidFire(#[from] serde_json::Error),

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}
