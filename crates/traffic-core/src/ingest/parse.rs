//! Payload parsing per topic

use super::{topics, IngestEvent, TopicMessage};
use crate::error::IngestError;
use crate::models::{FireReading, Severity};

/// Parse a sensor message into an event
///
/// # Payload formats
/// * density: exactly `Low`, `Medium` or `High`
/// * vehicle count: decimal integer, surrounding whitespace ignored
/// * emergency: `true` (any case) means detected, anything else means clear
/// * fire: JSON `{"detected": bool, "level": number}`
pub fn parse_message(message: &TopicMessage) -> Result<IngestEvent, IngestError> {
    let payload = message.payload.as_str();

    match message.topic.as_str() {
        topics::DENSITY => Severity::from_reported(payload)
            .map(IngestEvent::Density)
            .ok_or_else(|| IngestError::InvalidDensity(payload.to_string())),
        topics::VEHICLE_COUNT => payload
            .trim()
            .parse::<i64>()
            .map(IngestEvent::VehicleCount)
            .map_err(|_| IngestError::InvalidCount(payload.to_string())),
        topics::EMERGENCY => Ok(IngestEvent::Priority(payload.eq_ignore_ascii_case("true"))),
        topics::FIRE => {
            let reading: FireReading = serde_json::from_str(payload)?;
            Ok(IngestEvent::Fire(reading))
        }
        other => Err(IngestError::UnknownTopic(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(topic: &str, payload: &str) -> Result<IngestEvent, IngestError> {
        parse_message(&TopicMessage::new(topic, payload))
    }

    #[test]
    fn test_parse_density() {
        assert_eq!(
            parse(topics::DENSITY, "Medium").unwrap(),
            IngestEvent::Density(Severity::Medium)
        );
        assert!(matches!(
            parse(topics::DENSITY, "medium"),
            Err(IngestError::InvalidDensity(_))
        ));
        assert!(matches!(
            parse(topics::DENSITY, "Jammed"),
            Err(IngestError::InvalidDensity(_))
        ));
    }

    #[test]
    fn test_parse_vehicle_count() {
        assert_eq!(
            parse(topics::VEHICLE_COUNT, " 42\n").unwrap(),
            IngestEvent::VehicleCount(42)
        );
        assert_eq!(
            parse(topics::VEHICLE_COUNT, "-3").unwrap(),
            IngestEvent::VehicleCount(-3)
        );
        assert!(matches!(
            parse(topics::VEHICLE_COUNT, "many"),
            Err(IngestError::InvalidCount(_))
        ));
        assert!(matches!(
            parse(topics::VEHICLE_COUNT, ""),
            Err(IngestError::InvalidCount(_))
        ));
    }

    #[test]
    fn test_parse_emergency() {
        assert_eq!(
            parse(topics::EMERGENCY, "TRUE").unwrap(),
            IngestEvent::Priority(true)
        );
        assert_eq!(
            parse(topics::EMERGENCY, "false").unwrap(),
            IngestEvent::Priority(false)
        );
        assert_eq!(
            parse(topics::EMERGENCY, "yes").unwrap(),
            IngestEvent::Priority(false)
        );
    }

    #[test]
    fn test_parse_fire() {
        let event = parse(topics::FIRE, r#"{"detected": true, "level": 310.5}"#).unwrap();
        assert_eq!(
            event,
            IngestEvent::Fire(FireReading {
                detected: true,
                level: 310.5
            })
        );

        assert!(matches!(
            parse(topics::FIRE, "smoke!"),
            Err(IngestError::InvalidFire(_))
        ));
        assert!(matches!(
            parse(topics::FIRE, r#"{"detected": true}"#),
            Err(IngestError::InvalidFire(_))
        ));
    }

    #[test]
    fn test_parse_unknown_topic() {
        let err = parse("traffic/weather", "rain").unwrap_err();
        assert!(matches!(err, IngestError::UnknownTopic(ref t) if t == "traffic/weather"));
    }

    #[test]
    fn test_event_reports_source_topic() {
        for topic in topics::ALL {
            let payload = if topic == topics::FIRE {
                r#"{"detected": false, "level": 0}"#
            } else if topic == topics::DENSITY {
                "Low"
            } else {
                "1"
            };
            assert_eq!(parse(topic, payload).unwrap().topic(), topic);
        }
    }
}
