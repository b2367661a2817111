//! Live status and alert commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;
use traffic_core::{Alert, LiveSnapshot};

use crate::client::ApiClient;
use crate::output::{
    color_active, color_priority, color_severity, format_timestamp, print_json, print_warning,
    OutputFormat,
};

/// Row for alerts table
#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Type")]
    alert_type: String,
    #[tabled(rename = "Details")]
    details: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Raised")]
    timestamp: String,
}

/// Show the live intersection status
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let snapshot: LiveSnapshot = client.get("api/status").await?;

    match format {
        OutputFormat::Json => print_json(&snapshot)?,
        OutputFormat::Table => {
            println!("{}", "Intersection Status".bold());
            println!("{}", "=".repeat(40));
            println!("Traffic level:    {}", color_severity(snapshot.traffic_level));
            println!("Vehicle count:    {}", snapshot.vehicle_count);

            let priority = color_priority(&snapshot.priority_label);
            match snapshot.priority_since {
                Some(since) => println!(
                    "Priority vehicle: {} (since {})",
                    priority,
                    format_timestamp(&since)
                ),
                None => println!("Priority vehicle: {}", priority),
            }

            if snapshot.fire_alert {
                println!(
                    "Fire alert:       {} (smoke level {})",
                    "ACTIVE".red().bold(),
                    snapshot.smoke_level
                );
            } else {
                println!("Fire alert:       {}", "none".green());
            }

            println!();
            println!("Last updated: {}", format_timestamp(&snapshot.last_updated));
        }
    }

    Ok(())
}

/// List fire alerts, newest first
pub async fn show_alerts(client: &ApiClient, active_only: bool, format: OutputFormat) -> Result<()> {
    let mut alerts: Vec<Alert> = client.get("api/alerts").await?;

    if active_only {
        alerts.retain(|a| a.is_active);
    }
    alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    match format {
        OutputFormat::Json => print_json(&alerts)?,
        OutputFormat::Table => {
            if alerts.is_empty() {
                print_warning("No alerts found");
                return Ok(());
            }

            let rows: Vec<AlertRow> = alerts
                .iter()
                .map(|a| AlertRow {
                    id: a.id,
                    alert_type: a.alert_type.to_string(),
                    details: a.details.clone(),
                    state: color_active(a.is_active),
                    timestamp: format_timestamp(&a.timestamp),
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
