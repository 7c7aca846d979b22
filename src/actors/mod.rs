// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for asynchronous work.
//
// Note: the write side (enrollment commands) uses a CommandHandler, NOT
//       actors. Actors serve the read side, where event delivery is
//       asynchronous and queries share the mailbox with events.
//
// ============================================================================

mod projection_actor;

pub use projection_actor::{
    FindEnrollmentById,
    FindEnrollmentsByCourse,
    FindEnrollmentsByStudent,
    ProjectionActor,
    ProjectionPublisher,
};
