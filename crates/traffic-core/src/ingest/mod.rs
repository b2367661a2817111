//! Sensor message ingestion
//!
//! Sensors publish plain-text or JSON payloads on a small fixed set of
//! topics. This module turns a `(topic, payload)` pair into a typed
//! [`IngestEvent`] that the dashboard state can apply.

mod parse;

pub use parse::parse_message;

use serde::{Deserialize, Serialize};

use crate::models::{FireReading, Severity};

/// Topic names understood by the ingester
pub mod topics {
    pub const DENSITY: &str = "traffic/density";
    pub const VEHICLE_COUNT: &str = "vehicle_counter/counter11";
    pub const EMERGENCY: &str = "traffic/emergency";
    pub const FIRE: &str = "traffic/fire";

    pub const ALL: [&str; 4] = [DENSITY, VEHICLE_COUNT, EMERGENCY, FIRE];
}

/// Raw message as published by a sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessage {
    pub topic: String,
    pub payload: String,
}

impl TopicMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Typed sensor event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestEvent {
    /// Traffic level reported by a density sensor
    Density(Severity),
    /// Raw vehicle count, classified when applied
    VehicleCount(i64),
    /// Priority vehicle detection signal
    Priority(bool),
    /// Fire sensor reading
    Fire(FireReading),
}

impl IngestEvent {
    /// Topic this event kind arrives on
    pub fn topic(&self) -> &'static str {
        match self {
            IngestEvent::Density(_) => topics::DENSITY,
            IngestEvent::VehicleCount(_) => topics::VEHICLE_COUNT,
            IngestEvent::Priority(_) => topics::EMERGENCY,
            IngestEvent::Fire(_) => topics::FIRE,
        }
    }
}
