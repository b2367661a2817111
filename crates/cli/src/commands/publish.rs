//! Publish a sensor message to the dashboard

use anyhow::{Context, Result};
use traffic_core::ingest::{parse_message, TopicMessage};
use traffic_core::LiveSnapshot;

use crate::client::ApiClient;
use crate::output::{color_priority, color_severity, print_json, print_success, OutputFormat};

/// Publish a message and show the snapshot it produced
pub async fn publish_message(
    client: &ApiClient,
    topic: &str,
    payload: &str,
    format: OutputFormat,
) -> Result<()> {
    let message = TopicMessage::new(topic, payload);

    // Catch malformed payloads before they reach the service
    let event = parse_message(&message).context("Message rejected")?;

    let snapshot: LiveSnapshot = client.post("api/ingest", &message).await?;

    match format {
        OutputFormat::Json => print_json(&snapshot)?,
        OutputFormat::Table => {
            print_success(&format!("Published {:?} to {}", event, event.topic()));
            println!(
                "Traffic level: {}  Vehicles: {}  Priority: {}",
                color_severity(snapshot.traffic_level),
                snapshot.vehicle_count,
                color_priority(&snapshot.priority_label)
            );
        }
    }

    Ok(())
}
