// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Domain-specific aggregates live here, completely separate from the event
// sourcing infrastructure in src/event_sourcing/.
//
// ============================================================================

pub mod enrollment;
