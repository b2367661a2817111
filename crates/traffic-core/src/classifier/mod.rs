//! Status classification for dashboard values
//!
//! This module provides:
//! - Severity banding of a metric value against configured thresholds
//! - Windowed aggregation of recorded samples
//! - Priority detection labels
//!
//! Every function here is pure and may be called on each refresh tick.

mod priority;
mod severity;
mod window;

pub use priority::{priority_label, DETECTED, NOT_DETECTED};
pub use severity::classify;
pub use window::aggregate;
