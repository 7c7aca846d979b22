use anyhow::Result;
use super::event::EventEnvelope;

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. State is derived from events (not stored directly)
// 2. Commands are validated before emitting events
// 3. Events represent facts that have already happened
// 4. All state changes flow through events
//
// ============================================================================

/// Generic Aggregate trait - all event-sourced aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Create new aggregate from first event
    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle a command addressed to an identity with no history yet
    fn handle_initial_command(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Get aggregate ID
    fn aggregate_id(&self) -> &str;

    /// Get current version (sequence number of the last applied event)
    fn version(&self) -> i64;

    /// Pure state transition: `fold(state, event) -> state`
    fn fold(state: Option<Self>, event: &Self::Event) -> Result<Self, Self::Error> {
        match state {
            None => Self::apply_first_event(event),
            Some(mut aggregate) => {
                aggregate.apply_event(event)?;
                Ok(aggregate)
            }
        }
    }

    /// Load aggregate from event history (reconstruct from events)
    fn load_from_events(events: Vec<EventEnvelope<Self::Event>>) -> Result<Self>
    where
        Self::Error: std::error::Error + Send + Sync + 'static,
    {
        if events.is_empty() {
            anyhow::bail!("No events to load");
        }

        let mut state = None;
        for envelope in &events {
            state = Some(Self::fold(state, &envelope.event_data)?);
        }

        state.ok_or_else(|| anyhow::anyhow!("No events to load"))
    }
}
