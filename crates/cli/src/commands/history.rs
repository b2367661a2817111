//! Grouped history and windowed aggregate commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;
use traffic_core::{HistoryBucket, HistoryPeriod, TimeWindow};

use crate::client::{AggregateReport, ApiClient};
use crate::output::{
    color_severity, format_timestamp, format_value, print_info, print_json, print_warning,
    OutputFormat,
};

/// Row for history table
#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Bucket")]
    timestamp: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Count")]
    count: u64,
}

/// Show observation counts grouped by level per bucket
pub async fn show_history(client: &ApiClient, period: &str, format: OutputFormat) -> Result<()> {
    // Fail fast with the same message the service would return
    period.parse::<HistoryPeriod>()?;

    let path = format!("api/history?period={}", period);
    let buckets: Vec<HistoryBucket> = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&buckets)?,
        OutputFormat::Table => {
            if buckets.is_empty() {
                print_warning(&format!("No observations in the last {}", period));
                return Ok(());
            }

            let total: u64 = buckets.iter().map(|b| b.count).sum();
            let rows: Vec<BucketRow> = buckets
                .iter()
                .map(|b| BucketRow {
                    timestamp: format_timestamp(&b.timestamp),
                    level: color_severity(b.traffic_level),
                    count: b.count,
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!();
            print_info(&format!("{} observations grouped by {}", total, period));
        }
    }

    Ok(())
}

/// Count vehicle samples in a trailing window and show the latest one
pub async fn show_aggregate(client: &ApiClient, window: &str, format: OutputFormat) -> Result<()> {
    let window: TimeWindow = window.parse()?;

    let path = format!("api/aggregate?window={}", window);
    let report: AggregateReport = client.get(&path).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!("{}", format!("Vehicle Counts ({})", report.window).bold());
            println!("{}", "=".repeat(40));
            println!("Samples: {}", report.count);

            match (&report.latest, report.severity) {
                (Some(latest), Some(severity)) => {
                    println!(
                        "Latest:  {} at {} ({})",
                        format_value(latest.value),
                        format_timestamp(&latest.timestamp),
                        color_severity(severity)
                    );
                }
                (Some(latest), None) => {
                    println!(
                        "Latest:  {} at {}",
                        format_value(latest.value),
                        format_timestamp(&latest.timestamp)
                    );
                }
                (None, _) => print_warning("No samples in this window"),
            }
        }
    }

    Ok(())
}
