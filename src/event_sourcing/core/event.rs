use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use anyhow::Result;

// ============================================================================
// Event Envelope - Event Metadata
// ============================================================================
//
// Wraps domain events with the metadata the store and the read side need.
// Generic over the payload so the same envelope carries typed events in
// memory and serialized JSON at rest.
//
// ============================================================================

/// Generic Event Envelope - wraps any domain event with metadata
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    // Event Identity
    pub event_id: Uuid,
    pub aggregate_id: String,
    pub sequence_number: i64,

    // Event Type Information
    pub event_type: String,
    pub event_version: i32,

    // Event Payload
    pub event_data: E,

    // Causation & Correlation
    pub causation_id: Option<Uuid>,
    pub correlation_id: Uuid,

    // Timing
    pub timestamp: DateTime<Utc>,

    pub metadata: HashMap<String, String>,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        aggregate_id: impl Into<String>,
        sequence_number: i64,
        event_type: impl Into<String>,
        event_data: E,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id: aggregate_id.into(),
            sequence_number,
            event_type: event_type.into(),
            event_version: 1,
            event_data,
            causation_id: None,
            correlation_id,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Swap the payload while keeping every piece of metadata
    pub fn map_data<T>(self, f: impl FnOnce(E) -> T) -> EventEnvelope<T> {
        EventEnvelope {
            event_id: self.event_id,
            aggregate_id: self.aggregate_id,
            sequence_number: self.sequence_number,
            event_type: self.event_type,
            event_version: self.event_version,
            event_data: f(self.event_data),
            causation_id: self.causation_id,
            correlation_id: self.correlation_id,
            timestamp: self.timestamp,
            metadata: self.metadata,
        }
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// All domain events implement this trait to be used with the event store.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    /// Name recorded in the envelope (e.g. "EnrollmentCreated")
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// Event Serialization Helpers
// ============================================================================

pub fn serialize_event<E: Serialize>(event: &E) -> Result<String> {
    Ok(serde_json::to_string(event)?)
}

pub fn deserialize_event<E: for<'de> Deserialize<'de>>(json: &str) -> Result<E> {
    Ok(serde_json::from_str(json)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "TestEvent"
        }
    }

    #[test]
    fn test_event_envelope_creation() {
        let correlation_id = Uuid::new_v4();
        let event = TestEvent {
            data: "test".to_string(),
        };

        let envelope = EventEnvelope::new("enr-1", 1, event.event_type(), event, correlation_id);

        assert_eq!(envelope.aggregate_id, "enr-1");
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.event_version, 1);
        assert_eq!(envelope.correlation_id, correlation_id);
        assert!(envelope.causation_id.is_none());
    }

    #[test]
    fn test_map_data_keeps_metadata() {
        let causation_id = Uuid::new_v4();
        let mut envelope = EventEnvelope::new(
            "enr-1",
            3,
            "TestEvent",
            TestEvent { data: "x".to_string() },
            Uuid::new_v4(),
        );
        envelope.causation_id = Some(causation_id);
        envelope.metadata.insert("source".to_string(), "http".to_string());

        let event_id = envelope.event_id;
        let mapped = envelope.map_data(|e| serialize_event(&e).unwrap());

        assert_eq!(mapped.event_id, event_id);
        assert_eq!(mapped.sequence_number, 3);
        assert_eq!(mapped.causation_id, Some(causation_id));
        assert_eq!(mapped.metadata.get("source").map(String::as_str), Some("http"));

        let back: TestEvent = deserialize_event(&mapped.event_data).unwrap();
        assert_eq!(back.data, "x");
    }
}
