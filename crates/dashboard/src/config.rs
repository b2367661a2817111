//! Service configuration

use anyhow::{ensure, Context, Result};
use chrono::Duration;
use serde::Deserialize;
use traffic_core::log::LogConfig;
use traffic_core::state::StateConfig;
use traffic_core::ThresholdConfig;

/// Environment variable naming an alternative config file
const CONFIG_FILE_ENV: &str = "DASHBOARD_CONFIG_FILE";

/// Upper bound on log retention (10 years)
const MAX_RETENTION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Intersection this instance monitors
    #[serde(default = "default_intersection_id")]
    pub intersection_id: String,

    /// HTTP port for the API, push channel, health and metrics
    #[serde(default = "default_port")]
    pub port: u16,

    /// Severity band boundaries for vehicle counts
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// How long samples stay in the in-memory logs
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Maximum entries kept per log
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,

    /// Interval between retention passes
    #[serde(default = "default_maintenance_interval")]
    pub maintenance_interval_secs: u64,

    /// Buffered snapshots per live subscriber before it starts skipping
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_intersection_id() -> String {
    "intersection-main".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_retention_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_log_entries() -> usize {
    100_000
}

fn default_maintenance_interval() -> u64 {
    60
}

fn default_broadcast_capacity() -> usize {
    64
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            intersection_id: default_intersection_id(),
            port: default_port(),
            thresholds: ThresholdConfig::default(),
            retention_secs: default_retention_secs(),
            max_log_entries: default_max_log_entries(),
            maintenance_interval_secs: default_maintenance_interval(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from an optional file and `DASHBOARD_*` environment
    ///
    /// Nested keys use a double underscore, e.g. `DASHBOARD_THRESHOLDS__LOW_MAX`.
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| "dashboard".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("DASHBOARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let config: Self = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        self.thresholds
            .validate()
            .context("Invalid severity thresholds")?;
        ensure!(self.retention_secs > 0, "retention_secs must be positive");
        ensure!(self.max_log_entries > 0, "max_log_entries must be positive");
        ensure!(
            self.maintenance_interval_secs > 0,
            "maintenance_interval_secs must be positive"
        );
        Ok(())
    }

    pub fn maintenance_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.maintenance_interval_secs)
    }

    pub fn state_config(&self) -> StateConfig {
        let retention_secs = self.retention_secs.min(MAX_RETENTION_SECS) as i64;

        StateConfig {
            intersection_id: self.intersection_id.clone(),
            thresholds: self.thresholds,
            log: LogConfig {
                retention: Duration::seconds(retention_secs),
                max_entries: self.max_log_entries,
            },
            broadcast_capacity: self.broadcast_capacity,
        }
    }
}
