use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use anyhow::Result;

use crate::event_sourcing::core::{
    Aggregate, DomainEvent, EventEnvelope, deserialize_event, serialize_event,
};

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// Append-only, per-identity event log that works with ANY event type.
//
// Responsibilities:
// 1. Append events to the identity's stream (append-only)
// 2. Load event history for aggregates
// 3. Ensure optimistic concurrency control
// 4. Hand appended events to subscribers (outbox step)
//
// Events are kept serialized as JSON, the same shape they would have in a
// durable table, and decoded on load.
//
// Each stream has its own lock. The map lock is only held to find or create
// a stream, so appends to different identities run in parallel.
//
// ============================================================================

/// Receives every event after it has been appended.
///
/// Delivery happens while the stream is still locked, so a publisher sees the
/// events of one identity in sequence order. Implementations must not block.
pub trait EventPublisher<E>: Send + Sync {
    fn publish(&self, envelope: &EventEnvelope<E>);
}

#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    #[error("Concurrency conflict on {aggregate_id}: expected version {expected}, but current is {actual}")]
    ConcurrencyConflict {
        aggregate_id: String,
        expected: i64,
        actual: i64,
    },

    #[error("Cannot append empty event list")]
    EmptyAppend,

    #[error("Aggregate not found: {0}")]
    AggregateNotFound(String),
}

type Stream = Vec<EventEnvelope<String>>;

pub struct EventStore<E: DomainEvent> {
    streams: RwLock<HashMap<String, Arc<Mutex<Stream>>>>,
    publishers: std::sync::RwLock<Vec<Arc<dyn EventPublisher<E>>>>,
    aggregate_type_name: String, // e.g., "Enrollment"
    _phantom: PhantomData<E>,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(aggregate_type_name: &str) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            publishers: std::sync::RwLock::new(Vec::new()),
            aggregate_type_name: aggregate_type_name.to_string(),
            _phantom: PhantomData,
        }
    }

    /// Register a subscriber for appended events
    pub fn subscribe(&self, publisher: Arc<dyn EventPublisher<E>>) {
        match self.publishers.write() {
            Ok(mut publishers) => publishers.push(publisher),
            Err(poisoned) => poisoned.into_inner().push(publisher),
        }
    }

    /// Append events to the event store
    /// Returns the new version number after appending
    pub async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
    ) -> Result<i64> {
        if events.is_empty() {
            return Err(EventStoreError::EmptyAppend.into());
        }

        let handle = match self.stream(aggregate_id).await {
            Some(handle) => handle,
            // Only a first append may create the stream
            None if expected_version == 0 => self
                .streams
                .write()
                .await
                .entry(aggregate_id.to_string())
                .or_default()
                .clone(),
            None => {
                return Err(EventStoreError::ConcurrencyConflict {
                    aggregate_id: aggregate_id.to_string(),
                    expected: expected_version,
                    actual: 0,
                }
                .into());
            }
        };

        let mut stream = handle.lock().await;
        let current_version = stream.len() as i64;

        // Check optimistic concurrency
        if current_version != expected_version {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id: aggregate_id.to_string(),
                expected: expected_version,
                actual: current_version,
            }
            .into());
        }

        // Serialize everything before touching the stream so a bad event
        // leaves the log unchanged
        let mut new_version = expected_version;
        let mut stamped = Vec::with_capacity(events.len());
        let mut serialized = Vec::with_capacity(events.len());
        for mut envelope in events {
            new_version += 1;
            envelope.aggregate_id = aggregate_id.to_string();
            envelope.sequence_number = new_version;
            let json = serialize_event(&envelope.event_data)?;
            serialized.push(envelope.clone().map_data(|_| json));
            stamped.push(envelope);
        }

        stream.extend(serialized);

        let publishers = match self.publishers.read() {
            Ok(publishers) => publishers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for envelope in &stamped {
            for publisher in &publishers {
                publisher.publish(envelope);
            }
        }
        drop(stream);

        tracing::info!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = new_version,
            event_count = stamped.len(),
            "Appended events to event store"
        );

        Ok(new_version)
    }

    /// Load all events for an aggregate, in sequence order
    pub async fn load_events(&self, aggregate_id: &str) -> Result<Vec<EventEnvelope<E>>> {
        let Some(handle) = self.stream(aggregate_id).await else {
            return Ok(Vec::new());
        };
        let stream = handle.lock().await;

        let mut events = Vec::with_capacity(stream.len());
        for stored in stream.iter() {
            let event_data: E = deserialize_event(&stored.event_data)?;
            events.push(stored.clone().map_data(|_| event_data));
        }

        tracing::debug!("Loaded {} events for aggregate {}", events.len(), aggregate_id);
        Ok(events)
    }

    /// Get current version of aggregate (0 = no history)
    pub async fn current_version(&self, aggregate_id: &str) -> i64 {
        match self.stream(aggregate_id).await {
            Some(stream) => stream.lock().await.len() as i64,
            None => 0,
        }
    }

    /// Load aggregate from events
    pub async fn load_aggregate<A>(&self, aggregate_id: &str) -> Result<A>
    where
        A: Aggregate<Event = E>,
        A::Error: std::error::Error + Send + Sync + 'static,
    {
        let events = self.load_events(aggregate_id).await?;

        if events.is_empty() {
            return Err(EventStoreError::AggregateNotFound(aggregate_id.to_string()).into());
        }

        A::load_from_events(events)
    }

    /// Check if aggregate exists
    pub async fn aggregate_exists(&self, aggregate_id: &str) -> bool {
        self.current_version(aggregate_id).await > 0
    }

    async fn stream(&self, aggregate_id: &str) -> Option<Arc<Mutex<Stream>>> {
        self.streams.read().await.get(aggregate_id).cloned()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use uuid::Uuid;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct Noted {
        text: String,
    }

    impl DomainEvent for Noted {
        fn event_type(&self) -> &'static str {
            "Noted"
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        seen: std::sync::Mutex<Vec<(String, i64)>>,
    }

    impl EventPublisher<Noted> for RecordingPublisher {
        fn publish(&self, envelope: &EventEnvelope<Noted>) {
            self.seen
                .lock()
                .unwrap()
                .push((envelope.aggregate_id.clone(), envelope.sequence_number));
        }
    }

    fn envelope(text: &str) -> EventEnvelope<Noted> {
        EventEnvelope::new("", 0, "Noted", Noted { text: text.to_string() }, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_append_and_load_in_order() {
        let store = EventStore::<Noted>::new("Note");

        let v1 = store.append_events("a", 0, vec![envelope("one")]).await.unwrap();
        let v2 = store
            .append_events("a", v1, vec![envelope("two"), envelope("three")])
            .await
            .unwrap();

        assert_eq!(v1, 1);
        assert_eq!(v2, 3);

        let events = store.load_events("a").await.unwrap();
        let texts: Vec<_> = events.iter().map(|e| e.event_data.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        let seqs: Vec<_> = events.iter().map(|e| e.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert!(events.iter().all(|e| e.aggregate_id == "a"));
    }

    #[tokio::test]
    async fn test_concurrency_conflict_leaves_stream_untouched() {
        let store = EventStore::<Noted>::new("Note");
        store.append_events("a", 0, vec![envelope("one")]).await.unwrap();

        let err = store
            .append_events("a", 0, vec![envelope("stale")])
            .await
            .unwrap_err();

        match err.downcast_ref::<EventStoreError>() {
            Some(EventStoreError::ConcurrencyConflict { expected, actual, .. }) => {
                assert_eq!(*expected, 0);
                assert_eq!(*actual, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.current_version("a").await, 1);
    }

    #[tokio::test]
    async fn test_empty_append_rejected() {
        let store = EventStore::<Noted>::new("Note");
        let err = store.append_events("a", 0, vec![]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EventStoreError>(),
            Some(EventStoreError::EmptyAppend)
        ));
    }

    #[tokio::test]
    async fn test_streams_are_isolated() {
        let store = EventStore::<Noted>::new("Note");
        store.append_events("a", 0, vec![envelope("a1")]).await.unwrap();
        store.append_events("b", 0, vec![envelope("b1")]).await.unwrap();

        assert_eq!(store.current_version("a").await, 1);
        assert_eq!(store.current_version("b").await, 1);
        assert!(!store.aggregate_exists("c").await);
        assert!(store.load_events("c").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publishers_receive_appended_events() {
        let store = EventStore::<Noted>::new("Note");
        let publisher = Arc::new(RecordingPublisher::default());
        store.subscribe(publisher.clone());

        store.append_events("a", 0, vec![envelope("one")]).await.unwrap();
        store
            .append_events("a", 1, vec![envelope("two")])
            .await
            .unwrap();

        let seen = publisher.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![("a".to_string(), 1), ("a".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_append_on_unknown_stream_with_history_expected() {
        let store = EventStore::<Noted>::new("Note");

        let err = store.append_events("a", 2, vec![envelope("late")]).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EventStoreError>(),
            Some(EventStoreError::ConcurrencyConflict { expected: 2, actual: 0, .. })
        ));
        assert!(!store.aggregate_exists("a").await);
    }

    #[tokio::test]
    async fn test_locked_stream_does_not_block_other_streams() {
        let store = EventStore::<Noted>::new("Note");
        store.append_events("a", 0, vec![envelope("a1")]).await.unwrap();

        let a = store.stream("a").await.unwrap();
        let _held = a.lock().await;

        let appended = tokio::time::timeout(
            Duration::from_millis(200),
            store.append_events("b", 0, vec![envelope("b1")]),
        )
        .await;
        assert_eq!(appended.unwrap().unwrap(), 1);

        // "a" itself stays locked
        let blocked = tokio::time::timeout(Duration::from_millis(50), store.current_version("a")).await;
        assert!(blocked.is_err());
    }
}
