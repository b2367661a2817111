//! Core library for the traffic monitor
//!
//! This crate provides the core functionality for:
//! - Severity classification and windowed aggregation of counts
//! - Parsing sensor messages into typed events
//! - Bounded in-memory sample logs and grouped history
//! - Shared dashboard state with live update broadcast
//! - Health checks and observability

pub mod classifier;
pub mod error;
pub mod health;
pub mod history;
pub mod ingest;
pub mod log;
pub mod models;
pub mod observability;
pub mod state;

pub use classifier::{aggregate, classify, priority_label};
pub use error::{ClassifyError, IngestError, ParsePeriodError, ParseWindowError};
pub use health::{
    Component, ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use state::DashboardState;
