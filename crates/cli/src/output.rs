//! Output formatting utilities

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use traffic_core::Severity;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print any response as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Format a count without a trailing `.0`
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Color severity: low green, medium yellow, high red
pub fn color_severity(severity: Severity) -> String {
    let label = severity.as_str();
    match severity {
        Severity::Low => label.green().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::High => label.red().bold().to_string(),
    }
}

/// Color the priority label
pub fn color_priority(label: &str) -> String {
    match label {
        "detected" => label.red().bold().to_string(),
        "not-detected" => label.green().to_string(),
        _ => label.to_string(),
    }
}

/// Color an alert's active flag
pub fn color_active(is_active: bool) -> String {
    if is_active {
        "active".red().to_string()
    } else {
        "cleared".dimmed().to_string()
    }
}
