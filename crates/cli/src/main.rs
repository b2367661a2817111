//! Traffic monitor CLI
//!
//! A command-line tool for reading the live intersection status, grouped
//! history and alerts from a running dashboard, publishing sensor messages
//! and classifying counts offline.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{classify, history, publish, status};

const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Traffic monitor CLI
#[derive(Parser)]
#[command(name = "tmon")]
#[command(author, version, about = "CLI for the Traffic Monitor dashboard", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via TMON_API_URL env var)
    #[arg(long, env = "TMON_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the live intersection status
    Status,

    /// Show observation counts grouped by level and time bucket
    History {
        /// Bucket granularity (second, minute, hour)
        #[arg(long, default_value = "minute")]
        period: String,
    },

    /// Count vehicle samples in a trailing window
    Aggregate {
        /// Window length (e.g. 1m, 1h, 24h, 7d, 90s)
        #[arg(long, short, default_value = "1h")]
        window: String,
    },

    /// List fire alerts
    Alerts {
        /// Show only alerts that are still active
        #[arg(long)]
        active_only: bool,
    },

    /// Publish a sensor message to the dashboard
    Publish {
        /// Topic (traffic/density, vehicle_counter/counter11, traffic/emergency, traffic/fire)
        topic: String,

        /// Raw payload, e.g. `High`, `27`, `true` or `{"detected":true,"level":300}`
        payload: String,
    },

    /// Classify a value against severity thresholds without contacting the API
    Classify {
        /// Value to classify
        #[arg(allow_negative_numbers = true)]
        value: f64,

        /// Upper bound of the low band
        #[arg(long)]
        low_max: Option<f64>,

        /// Upper bound of the medium band
        #[arg(long)]
        medium_max: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    let format = match cli.format {
        Some(format) => format,
        None => config.output_format()?,
    };

    // Built on demand so offline commands never need a valid API URL
    let api_url = cli.api_url.or(config.api_url.clone());
    let connect = || {
        client::ApiClient::new(api_url.as_deref().unwrap_or(DEFAULT_API_URL))
    };

    match cli.command {
        Commands::Status => status::show_status(&connect()?, format).await?,
        Commands::History { period } => {
            history::show_history(&connect()?, &period, format).await?
        }
        Commands::Aggregate { window } => {
            history::show_aggregate(&connect()?, &window, format).await?
        }
        Commands::Alerts { active_only } => {
            status::show_alerts(&connect()?, active_only, format).await?
        }
        Commands::Publish { topic, payload } => {
            publish::publish_message(&connect()?, &topic, &payload, format).await?
        }
        Commands::Classify {
            value,
            low_max,
            medium_max,
        } => {
            let thresholds = config.thresholds(low_max, medium_max);
            classify::classify_value(value, thresholds, format)?
        }
    }

    Ok(())
}
