//! Configuration management for the CLI

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use traffic_core::ThresholdConfig;

use crate::output::OutputFormat;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
    /// Default output format
    pub default_format: Option<String>,
    /// Thresholds used by `classify` when no flags are given
    pub thresholds: Option<ThresholdConfig>,
}

impl Config {
    /// Load configuration from `~/.config/tmon/config.json`
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, defaulting when it is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Output format from the config file, table when unset
    pub fn output_format(&self) -> Result<OutputFormat> {
        match &self.default_format {
            Some(format) => OutputFormat::from_str(format, true)
                .map_err(|e| anyhow::anyhow!("Invalid default_format in config: {}", e)),
            None => Ok(OutputFormat::default()),
        }
    }

    /// Thresholds for offline classification; flags override the file
    pub fn thresholds(&self, low_max: Option<f64>, medium_max: Option<f64>) -> ThresholdConfig {
        let base = self.thresholds.unwrap_or_default();
        ThresholdConfig {
            low_max: low_max.unwrap_or(base.low_max),
            medium_max: medium_max.unwrap_or(base.medium_max),
        }
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("tmon").join("config.json"))
    }
}
